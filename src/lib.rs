//! rslabeler - 声明式规则驱动的表格数据行标注引擎
//! 核心能力：
//! 1. 规则集解析与加载（JSON 文件，名称大小写不敏感）
//! 2. 谓词求值与递归合取过滤（固定五种字面量操作）
//! 3. 多轮层级调度（延迟标签规则推迟到后续轮次，已标注行不可改写）
//! 4. 规则集校验（结构检查 + 语义冲突/重复检测）与规则回查

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod rule;

// 导出全局错误类型
pub use self::error::{RslResult, RslabelerError};

// 导出配置模块核心结构体与构建器
pub use crate::config::{ConfigBuilder, EngineConfig, DEFAULT_LEVELS};

// 导出数据集模型与会话
pub use crate::dataset::{Dataset, DatasetSession, LABEL_COLUMN, RULE_ID_COLUMN, UNASSIGNED};

// 导出规则模块核心接口与数据结构
pub use crate::rule::{
    normalize_submission, Condition, DuplicateChecker, DuplicateOutcome, DuplicatePair,
    MatchLogic, Rule, RuleInspector, RuleSetLoader, RuleValidator, RuleValue,
    ValidationOutcome, Violation,
};

// 导出引擎核心接口
pub use crate::engine::{
    AssignmentEngine, ConjunctiveFilter, FollowupOutcome, PredicateEvaluator, QuarantinedRule,
    RunReport,
};
