//! 全局引擎配置管理

use std::path::PathBuf;

/// 默认延迟层级标签（有序，先到先执行）
pub const DEFAULT_LEVELS: [&str; 2] = ["first", "second"];

/// 默认规则集目录
const DEFAULT_RULE_DIR: &str = "./rulesets";

/// 完整引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 规则集目录（一个规则集 = 一个 JSON 文件，文件基名即规则集名）
    pub rule_dir: PathBuf,
    /// 延迟层级标签列表（有序，不透明标签，可扩展为 N 层）
    pub levels: Vec<String>,
    /// 追加规则集名称（主规则集应用完成后再应用，可选）
    pub followup_set: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_dir: PathBuf::from(DEFAULT_RULE_DIR),
            levels: DEFAULT_LEVELS.iter().map(|s| s.to_string()).collect(),
            followup_set: None,
        }
    }
}

impl EngineConfig {
    /// 指定规则集目录的快捷构造
    pub fn with_rule_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            rule_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// 自定义构建器（链式 API）
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn rule_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.rule_dir = dir.into();
        self
    }

    /// 覆盖层级标签列表，顺序即多轮应用顺序
    pub fn levels<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.levels = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn followup_set(mut self, name: impl Into<String>) -> Self {
        self.config.followup_set = Some(name.into());
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
