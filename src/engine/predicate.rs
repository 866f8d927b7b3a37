//! 谓词求值器
//! 对候选行集合求值单个原子条件，返回命中行下标

use crate::dataset::Dataset;
use crate::error::{RslResult, RslabelerError};
use crate::rule::model::{Condition, MatchLogic};

/// 谓词求值器
#[derive(Debug, Default)]
pub struct PredicateEvaluator;

impl PredicateEvaluator {
    /// 对候选行求值一个条件，保持数据集原有行序
    /// - 比较两侧统一小写（大小写不敏感），value 元素先去首尾空白
    /// - value 为列表时任一元素命中即命中（并集语义）
    /// - 操作不受支持 → UnsupportedOperator；key 不是有效列 → MissingColumn
    pub fn eval(
        dataset: &Dataset,
        candidates: &[usize],
        condition: &Condition,
    ) -> RslResult<Vec<usize>> {
        let key = condition
            .key
            .as_deref()
            .ok_or_else(|| RslabelerError::InvalidInput("条件缺少 key 字段".to_string()))?;
        let raw_logic = condition
            .logic
            .as_deref()
            .ok_or_else(|| RslabelerError::InvalidInput("条件缺少 logic 字段".to_string()))?;
        let logic = MatchLogic::parse(raw_logic)
            .ok_or_else(|| RslabelerError::UnsupportedOperator(raw_logic.to_string()))?;
        if !dataset.has_column(key) {
            return Err(RslabelerError::MissingColumn(key.to_string()));
        }
        let value = condition
            .value
            .as_ref()
            .ok_or_else(|| RslabelerError::InvalidInput("条件缺少 value 字段".to_string()))?;

        // 归一化匹配值：去空白 + 小写
        let values: Vec<String> = value
            .items()
            .iter()
            .map(|v| v.trim().to_lowercase())
            .collect();

        let matched: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&row| Self::row_matches(dataset, row, key, logic, &values))
            .collect();

        log::debug!(
            "谓词求值完成 | 列: {} | 操作: {} | 候选行: {} | 命中行: {}",
            key,
            logic.as_str(),
            candidates.len(),
            matched.len()
        );
        Ok(matched)
    }

    #[inline(always)]
    fn row_matches(
        dataset: &Dataset,
        row: usize,
        key: &str,
        logic: MatchLogic,
        values: &[String],
    ) -> bool {
        let cell = dataset.value(row, key).unwrap_or("").to_lowercase();
        values.iter().any(|v| Self::matches_one(&cell, logic, v))
    }

    #[inline(always)]
    fn matches_one(cell: &str, logic: MatchLogic, value: &str) -> bool {
        match logic {
            MatchLogic::Equals => cell == value,
            MatchLogic::NotEquals => cell != value,
            MatchLogic::Contains => cell.contains(value),
            MatchLogic::NotContains => !cell.contains(value),
            MatchLogic::StartsWith => cell.starts_with(value),
        }
    }
}
