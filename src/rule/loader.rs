//! 规则集加载管理器
//! 按名称解析规则集文件（精确命中优先，其次目录内大小写不敏感扫描）并解析为规则列表

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::{RslResult, RslabelerError};
use crate::rule::model::Rule;

/// 规则集文件扩展名
const RULE_SET_EXT: &str = "json";

/// 规则集加载器
#[derive(Debug, Clone)]
pub struct RuleSetLoader {
    rule_dir: PathBuf,
}

impl RuleSetLoader {
    pub fn new(rule_dir: impl Into<PathBuf>) -> Self {
        Self {
            rule_dir: rule_dir.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.rule_dir.clone())
    }

    /// 按名称加载规则集
    /// 1. 精确路径命中：`<dir>/<name>.json`
    /// 2. 未命中时对目录做大小写不敏感扫描
    /// 3. 均未命中 → RuleSetNotFound；内容畸形 → RuleParseError
    pub fn load(&self, name: &str) -> RslResult<Vec<Rule>> {
        let path = self.resolve_path(name)?;
        let rules = Self::parse_file(&path, name)?;
        log::debug!(
            "规则集加载完成 | 名称: {} | 文件: {} | 规则数: {}",
            name,
            path.display(),
            rules.len()
        );
        Ok(rules)
    }

    /// 解析规则集文件内容（JSON 规则对象数组）
    pub fn parse_file(path: &Path, name: &str) -> RslResult<Vec<Rule>> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            RslabelerError::RuleParseError(format!("规则集 {} 内容畸形：{}", name, e))
        })
    }

    fn resolve_path(&self, name: &str) -> RslResult<PathBuf> {
        let exact = self.rule_dir.join(format!("{}.{}", name, RULE_SET_EXT));
        if exact.is_file() {
            return Ok(exact);
        }

        // 大小写不敏感回退扫描
        let wanted = name.to_lowercase();
        if self.rule_dir.is_dir() {
            for entry in fs::read_dir(&self.rule_dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                let ext_matches = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(RULE_SET_EXT));
                if !ext_matches {
                    continue;
                }
                let stem_matches = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.to_lowercase() == wanted);
                if stem_matches {
                    log::debug!("规则集大小写回退命中 | 名称: {} | 文件: {}", name, path.display());
                    return Ok(path);
                }
            }
        }

        Err(RslabelerError::RuleSetNotFound(name.to_string()))
    }
}
