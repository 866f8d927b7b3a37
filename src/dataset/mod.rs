//! 数据集模块：行列数据模型与活动数据集会话
pub mod frame;
pub mod session;

pub use frame::{Dataset, LABEL_COLUMN, RULE_ID_COLUMN, UNASSIGNED};
pub use session::DatasetSession;
