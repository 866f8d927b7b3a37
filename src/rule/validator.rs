//! 规则集校验器
//! 单规则内联模式（供引擎逐条隔离）与全集模式（含两两语义冲突扫描）

use std::fmt;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::rule::model::{Condition, Rule, RuleValue, SUPPORTED_LOGIC};

/// 单条校验违规
/// rule_ref 为违规规则的派生标识 `<规则集名>_<下标>`；
/// child 指向 associated_query 内的子条件下标（仅嵌套违规时存在）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    pub rule_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<usize>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.child {
            Some(idx) => write!(f, "{}（子条件 {}）：{}", self.rule_ref, idx, self.message),
            None => write!(f, "{}：{}", self.rule_ref, self.message),
        }
    }
}

/// 校验结论：通过，或完整的违规列表（绝不只报第一条）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// 转换为 Result，违规时携带完整违规列表
    pub fn into_result(self) -> crate::error::RslResult<()> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(violations) => {
                Err(crate::error::RslabelerError::ValidationError(violations))
            }
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "规则校验通过"),
            Self::Invalid(violations) => {
                let joined: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", joined.join("\n"))
            }
        }
    }
}

/// 规则集校验器
#[derive(Debug, Clone)]
pub struct RuleValidator {
    levels: Vec<String>,
}

impl RuleValidator {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.levels.iter().cloned())
    }

    /// 全集校验：逐条结构校验 + 两两语义冲突扫描
    pub fn validate_set(
        &self,
        dataset: &Dataset,
        rules: &[Rule],
        set_name: &str,
    ) -> ValidationOutcome {
        let mut violations = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            violations.extend(self.validate_rule(dataset, rule, index, set_name));
        }
        violations.extend(Self::conflict_scan(rules, set_name));

        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            log::debug!(
                "规则集校验未通过 | 名称: {} | 违规数: {}",
                set_name,
                violations.len()
            );
            ValidationOutcome::Invalid(violations)
        }
    }

    /// 单规则内联校验（引擎隔离用，不做冲突扫描）
    /// 返回该规则的全部违规；空列表即通过
    pub fn validate_rule(
        &self,
        dataset: &Dataset,
        rule: &Rule,
        index: usize,
        set_name: &str,
    ) -> Vec<Violation> {
        let rule_ref = format!("{}_{}", set_name, index);
        let mut violations = Vec::new();
        let mut push = |child: Option<usize>, message: String| {
            violations.push(Violation {
                rule_ref: rule_ref.clone(),
                child,
                message,
            });
        };

        // 1. 必填字段
        if rule.key.is_none() {
            push(None, "缺少 key 字段".to_string());
        }
        if rule.logic.is_none() {
            push(None, "缺少 logic 字段".to_string());
        }
        if rule.value.is_none() {
            push(None, "缺少 value 字段".to_string());
        }
        if rule.assign_to.is_none() {
            push(None, "缺少 assign_to 字段".to_string());
        }

        // 2. key 必须是数据集中的有效列
        if let Some(key) = rule.key.as_deref() {
            if !dataset.has_column(key) {
                push(None, format!("key 不是数据集中的有效列：{}", key));
            }
        }

        // 3. logic 必须在受支持操作集内（大小写不敏感）
        if let Some(logic) = rule.logic.as_deref() {
            if !SUPPORTED_LOGIC.contains(logic.trim().to_lowercase().as_str()) {
                push(None, format!("logic 不是受支持的匹配操作：{}", logic));
            }
        }

        // 4. post_run 必须是已知层级标签
        if let Some(tag) = rule.post_run.as_deref() {
            if !self.levels.iter().any(|l| l == tag) {
                push(None, format!("post_run 不是已知的层级标签：{}", tag));
            }
        }

        // 5. 子条件逐条复查（等价于 1-3，去掉 assign_to）
        for (child_idx, child) in rule.associated_query.iter().enumerate() {
            for violation in Self::check_condition(dataset, child) {
                push(Some(child_idx), violation);
            }
        }

        violations
    }

    fn check_condition(dataset: &Dataset, condition: &Condition) -> Vec<String> {
        let mut messages = Vec::new();
        if condition.key.is_none() {
            messages.push("缺少 key 字段".to_string());
        }
        if condition.logic.is_none() {
            messages.push("缺少 logic 字段".to_string());
        }
        if condition.value.is_none() {
            messages.push("缺少 value 字段".to_string());
        }
        if let Some(key) = condition.key.as_deref() {
            if !dataset.has_column(key) {
                messages.push(format!("key 不是数据集中的有效列：{}", key));
            }
        }
        if let Some(logic) = condition.logic.as_deref() {
            if !SUPPORTED_LOGIC.contains(logic.trim().to_lowercase().as_str()) {
                messages.push(format!("logic 不是受支持的匹配操作：{}", logic));
            }
        }
        messages
    }

    /// 两两语义冲突扫描（粗粒度包含启发式）
    /// 规则 i 的 value 被规则 j 的 value 包含，且 key 同向包含（子串/成员），
    /// 即视为潜在重叠；字段缺失的规则已有字段违规，不参与比较
    fn conflict_scan(rules: &[Rule], set_name: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        for i in 0..rules.len() {
            for j in (i + 1)..rules.len() {
                let (Some(key_i), Some(key_j)) = (rules[i].key.as_deref(), rules[j].key.as_deref())
                else {
                    continue;
                };
                let (Some(value_i), Some(value_j)) = (&rules[i].value, &rules[j].value) else {
                    continue;
                };
                if value_contained(value_i, value_j) && key_j.contains(key_i) {
                    violations.push(Violation {
                        rule_ref: format!("{}_{}", set_name, i),
                        child: None,
                        message: format!("与 {}_{} 存在语义冲突", set_name, j),
                    });
                }
            }
        }
        violations
    }
}

/// 包含启发式的各值形态分支：
/// 标量 in 标量 = 子串；标量 in 列表 = 成员；列表 in 标量 = 永不；列表 in 列表 = 子集
fn value_contained(a: &RuleValue, b: &RuleValue) -> bool {
    match (a, b) {
        (RuleValue::One(x), RuleValue::One(y)) => y.contains(x.as_str()),
        (RuleValue::One(x), RuleValue::Many(ys)) => ys.iter().any(|y| y == x),
        (RuleValue::Many(_), RuleValue::One(_)) => false,
        (RuleValue::Many(xs), RuleValue::Many(ys)) => {
            !xs.is_empty() && xs.iter().all(|x| ys.contains(x))
        }
    }
}
