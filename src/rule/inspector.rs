//! 规则回查器
//! 将派生标识 `<规则集名>_<下标>` 解析回字面规则定义，供审计使用

use crate::config::EngineConfig;
use crate::error::{RslResult, RslabelerError};
use crate::rule::loader::RuleSetLoader;
use crate::rule::model::Rule;

/// 规则回查器
#[derive(Debug, Clone)]
pub struct RuleInspector {
    loader: RuleSetLoader,
}

impl RuleInspector {
    pub fn new(loader: RuleSetLoader) -> Self {
        Self { loader }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(RuleSetLoader::from_config(config))
    }

    /// 单条回查：名称部分大小写不敏感；规则集或下标无效 → Ok(None)
    /// 标识从最后一个下划线拆分，规则集名自身允许包含下划线
    pub fn inspect(&self, rule_id: &str) -> RslResult<Option<Rule>> {
        let Some((set_name, index_raw)) = rule_id.rsplit_once('_') else {
            return Ok(None);
        };
        let Ok(index) = index_raw.parse::<usize>() else {
            return Ok(None);
        };

        match self.loader.load(set_name) {
            Ok(rules) => Ok(rules.into_iter().nth(index)),
            Err(RslabelerError::RuleSetNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 批量回查：逐条保留未命中标记，单条失败不拖垮整批
    pub fn inspect_many<S: AsRef<str>>(&self, rule_ids: &[S]) -> Vec<Option<Rule>> {
        rule_ids
            .iter()
            .map(|id| match self.inspect(id.as_ref()) {
                Ok(found) => found,
                Err(e) => {
                    log::warn!("规则回查失败 | 标识: {} | 原因: {}", id.as_ref(), e);
                    None
                }
            })
            .collect()
    }
}
