//! 全局错误类型定义
use thiserror::Error;

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;

use crate::rule::validator::Violation;

#[derive(Error, Debug)]
pub enum RslabelerError {
    // 数据集相关错误
    #[error("数据列不存在：{0}")]
    MissingColumn(String),
    #[error("数据集为空：{0}")]
    EmptyDataset(String),

    // 规则相关错误
    #[error("不支持的匹配操作：{0}")]
    UnsupportedOperator(String),
    #[error("规则集未找到：{0}")]
    RuleSetNotFound(String),
    #[error("规则解析失败：{0}")]
    RuleParseError(String),
    #[error("规则校验未通过：共 {} 条违规", .0.len())]
    ValidationError(Vec<Violation>),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type RslResult<T> = Result<T, RslabelerError>;
