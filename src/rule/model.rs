//! 规则数据模型定义
//! 仅存储规则数据与解码规范化逻辑，匹配语义见 engine 模块

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{RslResult, RslabelerError};

/// 受支持的匹配操作名称（小写形式）
pub static SUPPORTED_LOGIC: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["equals", "not_equals", "contains", "not_contains", "starts_with"]
        .into_iter()
        .collect()
});

/// 匹配操作枚举
/// 固定五种字面量操作，无模式语法；解析时大小写不敏感
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLogic {
    /// 全等匹配
    Equals,
    /// 全等取反
    NotEquals,
    /// 子串匹配（字面量，无正则）
    Contains,
    /// 子串取反
    NotContains,
    /// 前缀匹配
    StartsWith,
}

impl MatchLogic {
    /// 大小写不敏感解析；不在固定操作集内返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "contains" => Some(Self::Contains),
            "not_contains" => Some(Self::NotContains),
            "starts_with" => Some(Self::StartsWith),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
        }
    }
}

/// 规则匹配值：单个标量或标量列表
/// 列表表示"任一元素命中即命中"（行级 OR）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleValue {
    One(String),
    Many(Vec<String>),
}

impl RuleValue {
    /// 以切片视角访问全部元素
    pub fn items(&self) -> &[String] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }
}

// 解码时统一做标量收束：数字/布尔转为字符串形式，与数据集单元格对齐
impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Array(items) => items
                .into_iter()
                .map(coerce_scalar::<D>)
                .collect::<Result<Vec<_>, _>>()
                .map(RuleValue::Many),
            other => coerce_scalar::<D>(other).map(RuleValue::One),
        }
    }
}

fn coerce_scalar<'de, D: Deserializer<'de>>(value: Value) -> Result<String, D::Error> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("value 不支持的标量形式：{}", other))),
    }
}

/// 原子匹配条件：(key, logic, value) 三元组
/// 字段在模型层全部可缺省：结构不完整的条件要由校验器给出定位到字段的违规，
/// 而不是在解码阶段让整个规则集失败
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Condition {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub logic: Option<String>,
    #[serde(default)]
    pub value: Option<RuleValue>,
}

/// 单条规则：顶层条件 + 标签 + 可选的嵌套条件与延迟层级
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub logic: Option<String>,
    #[serde(default)]
    pub value: Option<RuleValue>,
    /// 命中后写入 label 列的类别标签
    #[serde(default)]
    pub assign_to: Option<String>,
    /// 延迟层级标签；存在时规则推迟到对应轮次应用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_run: Option<String>,
    /// 嵌套子条件，与顶层条件按逻辑与合取
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_query: Vec<Condition>,
}

impl Rule {
    /// 投影出规则自身的顶层条件
    pub fn condition(&self) -> Condition {
        Condition {
            key: self.key.clone(),
            logic: self.logic.clone(),
            value: self.value.clone(),
        }
    }

    /// 结构全等比较（重复检测专用）
    /// 比较 key / logic / value / assign_to / associated_query，不含 post_run
    pub fn structurally_equal(&self, other: &Rule) -> bool {
        self.key == other.key
            && self.logic == other.logic
            && self.value == other.value
            && self.assign_to == other.assign_to
            && self.associated_query == other.associated_query
    }
}

/// 规则提交归一化：单个规则对象或规则对象数组 → 规则列表
/// 空数组视为无效输入
pub fn normalize_submission(text: &str) -> RslResult<Vec<Rule>> {
    let raw: Value = serde_json::from_str(text)?;
    match raw {
        Value::Array(_) => {
            let rules: Vec<Rule> = serde_json::from_value(raw)?;
            if rules.is_empty() {
                return Err(RslabelerError::InvalidInput("规则列表为空".to_string()));
            }
            Ok(rules)
        }
        Value::Object(_) => {
            let rule: Rule = serde_json::from_value(raw)?;
            Ok(vec![rule])
        }
        _ => Err(RslabelerError::InvalidInput(
            "规则提交必须是 JSON 对象或对象数组".to_string(),
        )),
    }
}
