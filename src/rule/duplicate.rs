//! 规则集目录重复检测
//! 跨文件（含同文件）扫描结构全等的规则对；与校验器的包含启发式不同，
//! 这里按字段全等比较，且绝不把规则与其自身报告为重复

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::RslResult;
use crate::rule::loader::RuleSetLoader;
use crate::rule::model::Rule;

/// 一对结构全等的规则（派生标识）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DuplicatePair {
    pub first: String,
    pub second: String,
}

impl fmt::Display for DuplicatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 与 {} 重复", self.first, self.second)
    }
}

/// 重复检测结论
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum DuplicateOutcome {
    NoneFound,
    Found(Vec<DuplicatePair>),
}

impl fmt::Display for DuplicateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneFound => write!(f, "未发现重复规则"),
            Self::Found(pairs) => {
                let joined: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", joined.join("\n"))
            }
        }
    }
}

/// 重复检测器
#[derive(Debug, Clone)]
pub struct DuplicateChecker {
    rule_dir: PathBuf,
}

impl DuplicateChecker {
    pub fn new(rule_dir: impl Into<PathBuf>) -> Self {
        Self {
            rule_dir: rule_dir.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.rule_dir.clone())
    }

    /// 扫描目录内全部规则集文件，报告结构全等的规则对
    /// 文件对只扫描一次（无序对）；同文件内只比较严格递增的下标对，
    /// 排除自反对；畸形文件作为解析错误向上传播
    pub fn check(&self) -> RslResult<DuplicateOutcome> {
        // 1. 收集并解析全部规则集文件（按名排序保证输出稳定）
        let mut sets: Vec<(String, Vec<Rule>)> = Vec::new();
        for entry in fs::read_dir(&self.rule_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let ext_matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if !ext_matches {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            let rules = RuleSetLoader::parse_file(&path, &name)?;
            sets.push((name, rules));
        }
        sets.sort_by(|a, b| a.0.cmp(&b.0));
        log::debug!("重复检测开始 | 规则集数: {}", sets.len());

        // 2. 两两比较
        let mut pairs = Vec::new();
        for i in 0..sets.len() {
            for j in i..sets.len() {
                let same_file = i == j;
                for (ii, a) in sets[i].1.iter().enumerate() {
                    for (jj, b) in sets[j].1.iter().enumerate() {
                        if same_file && jj <= ii {
                            continue;
                        }
                        if a.structurally_equal(b) {
                            pairs.push(DuplicatePair {
                                first: format!("{}_{}", sets[i].0, ii),
                                second: format!("{}_{}", sets[j].0, jj),
                            });
                        }
                    }
                }
            }
        }

        if pairs.is_empty() {
            Ok(DuplicateOutcome::NoneFound)
        } else {
            log::info!("重复检测完成 | 重复对数: {}", pairs.len());
            Ok(DuplicateOutcome::Found(pairs))
        }
    }
}
