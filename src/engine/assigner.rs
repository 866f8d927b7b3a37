//! 规则应用引擎核心
//! 核心职责：
//! 1. 规则集多轮调度（未延迟规则立即应用，层级标记规则推迟到后续轮次）
//! 2. 单规则内联校验与隔离（结构非法规则跳过，不中断整轮运行）
//! 3. 命中行标注（label / rule_id，规则标识取自原始批次下标）
//! 4. 运行报告聚合（轮次/标注行数/隔离规则，可区分部分成功）

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::engine::filter::ConjunctiveFilter;
use crate::error::{RslResult, RslabelerError};
use crate::rule::loader::RuleSetLoader;
use crate::rule::model::Rule;
use crate::rule::validator::{RuleValidator, Violation};

/// 被隔离的规则及其违规明细
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuarantinedRule {
    pub rule_ref: String,
    pub index: usize,
    pub violations: Vec<Violation>,
}

/// 追加规则集的执行结论
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum FollowupOutcome {
    /// 追加规则集已应用
    Applied(Box<RunReport>),
    /// 追加规则集未找到（主规则集结果仍然有效）
    Missing(String),
}

/// 单次规则集应用的运行报告
/// 调用方据此区分"未发生任何应用 / 全部应用 / 部分应用（存在隔离规则）"
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub set_name: String,
    /// 实际执行的轮次数
    pub passes: usize,
    /// 实际求值并应用的规则数（不含隔离与延迟中转）
    pub applied_rules: usize,
    /// 本次运行新标注的行数
    pub assigned_rows: usize,
    pub quarantined: Vec<QuarantinedRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup: Option<FollowupOutcome>,
}

impl RunReport {
    fn new(set_name: &str) -> Self {
        Self {
            set_name: set_name.to_string(),
            passes: 0,
            applied_rules: 0,
            assigned_rows: 0,
            quarantined: Vec::new(),
            followup: None,
        }
    }

    /// 是否部分成功（存在被隔离的规则）
    pub fn is_partial(&self) -> bool {
        !self.quarantined.is_empty()
    }
}

/// 规则应用引擎
pub struct AssignmentEngine {
    config: EngineConfig,
}

impl AssignmentEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 将一个规则列表应用到数据集（多轮调度核心）
    ///
    /// 轮转算法：剩余层级队列初始化为配置的完整层级表；
    /// 每轮按序处理当前批次——非法规则隔离、层级仍在队列中的规则进入延迟批次、
    /// 其余规则立即求值并标注；延迟批次非空则弹出队首层级进入下一轮，
    /// 为空则调度结束。已标注的行由过滤基底排除，后续轮次不可能改写
    pub fn apply(
        &self,
        dataset: &mut Dataset,
        rules: &[Rule],
        set_name: &str,
    ) -> RslResult<RunReport> {
        // 空数据集是前置条件违反，且必须发生在任何改写之前
        if dataset.is_empty() {
            return Err(RslabelerError::EmptyDataset(set_name.to_string()));
        }
        dataset.ensure_assignment_columns();

        let validator = RuleValidator::from_config(&self.config);
        let mut report = RunReport::new(set_name);
        let mut remaining: VecDeque<String> = self.config.levels.iter().cloned().collect();
        let mut batch: Vec<(usize, &Rule)> = rules.iter().enumerate().collect();

        loop {
            report.passes += 1;
            let mut deferred: Vec<(usize, &Rule)> = Vec::new();

            for (index, rule) in batch {
                // 内联校验：非法规则隔离后继续
                let violations = validator.validate_rule(dataset, rule, index, set_name);
                if !violations.is_empty() {
                    log::warn!(
                        "规则已隔离 | 规则: {}_{} | 违规数: {}",
                        set_name,
                        index,
                        violations.len()
                    );
                    report.quarantined.push(QuarantinedRule {
                        rule_ref: format!("{}_{}", set_name, index),
                        index,
                        violations,
                    });
                    continue;
                }

                // 层级延迟：标签仍在剩余队列中 → 本轮不应用
                if let Some(tag) = rule.post_run.as_deref() {
                    if remaining.iter().any(|level| level == tag) {
                        deferred.push((index, rule));
                        continue;
                    }
                }

                // 求值并标注；零命中是无操作而非错误
                let matched =
                    ConjunctiveFilter::resolve(dataset, &rule.condition(), &rule.associated_query)?;
                let label = rule.assign_to.as_deref().ok_or_else(|| {
                    RslabelerError::InvalidInput(format!("规则 {}_{} 缺少 assign_to", set_name, index))
                })?;
                let rule_id = format!("{}_{}", set_name, index);
                for &row in &matched {
                    dataset.assign(row, label, &rule_id);
                }
                report.applied_rules += 1;
                report.assigned_rows += matched.len();
                log::debug!("规则应用完成 | 规则: {} | 命中行数: {}", rule_id, matched.len());
            }

            if deferred.is_empty() {
                break;
            }
            remaining.pop_front();
            batch = deferred;
        }

        log::info!(
            "规则集应用完成 | 名称: {} | 轮次: {} | 标注行数: {} | 隔离规则数: {}",
            set_name,
            report.passes,
            report.assigned_rows,
            report.quarantined.len()
        );
        Ok(report)
    }

    /// 按名称解析并应用规则集；配置了追加规则集时随后继续应用
    /// 追加规则集缺失只记录在报告中，已标注的数据集保持有效
    pub fn process(&self, dataset: &mut Dataset, set_name: &str) -> RslResult<RunReport> {
        let loader = RuleSetLoader::from_config(&self.config);
        let rules = loader.load(set_name)?;
        let mut report = self.apply(dataset, &rules, set_name)?;

        if let Some(followup_name) = self.config.followup_set.clone() {
            match loader.load(&followup_name) {
                Ok(followup_rules) => {
                    let followup_report = self.apply(dataset, &followup_rules, &followup_name)?;
                    report.followup = Some(FollowupOutcome::Applied(Box::new(followup_report)));
                }
                Err(RslabelerError::RuleSetNotFound(name)) => {
                    log::warn!("追加规则集缺失 | 名称: {}", name);
                    report.followup = Some(FollowupOutcome::Missing(name));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{LABEL_COLUMN, RULE_ID_COLUMN, UNASSIGNED};
    use crate::rule::model::normalize_submission;

    fn engine() -> AssignmentEngine {
        AssignmentEngine::new(EngineConfig::default())
    }

    /// 规范场景数据集：{A:a,B:b,C:c}, {A:d,B:e,C:f}, {A:x,B:y,C:z}
    fn sample() -> Dataset {
        let mut dataset = Dataset::with_columns(["A", "B", "C"]);
        dataset.push_row(&["a", "b", "c"]).unwrap();
        dataset.push_row(&["d", "e", "f"]).unwrap();
        dataset.push_row(&["x", "y", "z"]).unwrap();
        dataset
    }

    fn rules(json: &str) -> Vec<Rule> {
        normalize_submission(json).unwrap()
    }

    #[test]
    fn test_single_rule_assignment() {
        let mut dataset = sample();
        let rules = rules(r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"}]"#);

        let report = engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("test"));
        assert_eq!(dataset.value(0, RULE_ID_COLUMN), Some("demo_0"));
        assert_eq!(dataset.value(1, LABEL_COLUMN), Some(UNASSIGNED));
        assert_eq!(dataset.value(2, LABEL_COLUMN), Some(UNASSIGNED));
        assert_eq!(report.assigned_rows, 1);
        assert!(!report.is_partial());
    }

    #[test]
    fn test_deferred_rule_cannot_override() {
        // 规则 1 延迟到 "first" 层，也命中第 0 行，但不得改写规则 0 的标注
        let mut dataset = sample();
        let rules = rules(
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"},
                {"key":"B","logic":"equals","value":"b","assign_to":"late","post_run":"first"}]"#,
        );

        let report = engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("test"));
        assert_eq!(dataset.value(0, RULE_ID_COLUMN), Some("demo_0"));
        assert_eq!(report.passes, 2);
    }

    #[test]
    fn test_level_scheduling_order() {
        // 无标签规则先行认领；"first" 层次之；"second" 层最后兜底
        let mut dataset = Dataset::with_columns(["host"]);
        dataset.push_row(&["web01"]).unwrap();
        dataset.push_row(&["web02"]).unwrap();
        dataset.push_row(&["db01"]).unwrap();

        let rules = rules(
            r#"[{"key":"host","logic":"starts_with","value":"web","assign_to":"frontend"},
                {"key":"host","logic":"contains","value":"01","assign_to":"tier_one","post_run":"first"},
                {"key":"host","logic":"contains","value":"0","assign_to":"fallback","post_run":"second"}]"#,
        );

        let report = engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert_eq!(report.passes, 3);
        // web01 被无标签规则认领，first 层只拿到 db01，second 层无剩余可认领
        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("frontend"));
        assert_eq!(dataset.value(1, LABEL_COLUMN), Some("frontend"));
        assert_eq!(dataset.value(2, LABEL_COLUMN), Some("tier_one"));
        assert_eq!(dataset.value(2, RULE_ID_COLUMN), Some("demo_1"));
    }

    #[test]
    fn test_idempotent_reapplication() {
        let mut dataset = sample();
        let rules = rules(
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"},
                {"key":"B","logic":"equals","value":"e","assign_to":"mid"}]"#,
        );

        engine().apply(&mut dataset, &rules, "demo").unwrap();
        let snapshot = dataset.clone();
        let second = engine().apply(&mut dataset, &rules, "demo").unwrap();

        // 已标注的行不再参与求值，二次应用是恒等操作
        assert_eq!(dataset, snapshot);
        assert_eq!(second.assigned_rows, 0);
    }

    #[test]
    fn test_quarantine_keeps_run_alive() {
        let mut dataset = sample();
        let rules = rules(
            r#"[{"key":"A","logic":"equals","value":"a"},
                {"key":"B","logic":"equals","value":"e","assign_to":"mid"}]"#,
        );

        let report = engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert!(report.is_partial());
        assert_eq!(report.quarantined.len(), 1);
        assert_eq!(report.quarantined[0].rule_ref, "demo_0");
        // 合法规则照常生效
        assert_eq!(dataset.value(1, LABEL_COLUMN), Some("mid"));
        assert_eq!(dataset.value(0, LABEL_COLUMN), Some(UNASSIGNED));
    }

    #[test]
    fn test_empty_dataset_rejected_unchanged() {
        let mut dataset = Dataset::with_columns(["A"]);
        let rules = rules(r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"}]"#);

        let err = engine().apply(&mut dataset, &rules, "demo").unwrap_err();
        assert!(matches!(err, RslabelerError::EmptyDataset(name) if name == "demo"));
        // 错误先于任何改写：引擎专属列未被创建
        assert_eq!(dataset.columns(), &["A"]);
    }

    #[test]
    fn test_identical_rules_keep_positional_ids() {
        // 结构完全相同的两条规则：标识取原始下标，绝不由相等搜索推导
        let mut dataset = sample();
        let rules = rules(
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"},
                {"key":"A","logic":"equals","value":"a","assign_to":"test"}]"#,
        );

        let report = engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert_eq!(dataset.value(0, RULE_ID_COLUMN), Some("demo_0"));
        assert_eq!(report.applied_rules, 2);
    }

    #[test]
    fn test_nested_conditions_conjunction() {
        let mut dataset = sample();
        let rules = rules(
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"narrow",
                 "associated_query":[{"key":"B","logic":"equals","value":"b"},
                                     {"key":"C","logic":"equals","value":"c"}]},
                {"key":"A","logic":"equals","value":"d","assign_to":"other",
                 "associated_query":[{"key":"B","logic":"equals","value":"nope"}]}]"#,
        );

        engine().apply(&mut dataset, &rules, "demo").unwrap();

        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("narrow"));
        // 子条件不满足 → 规则 1 零命中
        assert_eq!(dataset.value(1, LABEL_COLUMN), Some(UNASSIGNED));
    }

    #[test]
    fn test_process_with_followup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.json"),
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("extra.json"),
            r#"[{"key":"B","logic":"equals","value":"e","assign_to":"extra_hit"}]"#,
        )
        .unwrap();

        let config = EngineConfig::builder()
            .rule_dir(dir.path())
            .followup_set("extra")
            .build();
        let engine = AssignmentEngine::new(config);

        let mut dataset = sample();
        let report = engine.process(&mut dataset, "main").unwrap();

        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("test"));
        assert_eq!(dataset.value(1, LABEL_COLUMN), Some("extra_hit"));
        assert_eq!(dataset.value(1, RULE_ID_COLUMN), Some("extra_0"));
        assert!(matches!(report.followup, Some(FollowupOutcome::Applied(_))));
    }

    #[test]
    fn test_process_followup_missing_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.json"),
            r#"[{"key":"A","logic":"equals","value":"a","assign_to":"test"}]"#,
        )
        .unwrap();

        let config = EngineConfig::builder()
            .rule_dir(dir.path())
            .followup_set("extra")
            .build();
        let engine = AssignmentEngine::new(config);

        let mut dataset = sample();
        let report = engine.process(&mut dataset, "main").unwrap();

        // 主规则集结果有效，追加集缺失仅记录在报告中
        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("test"));
        assert!(
            matches!(report.followup, Some(FollowupOutcome::Missing(name)) if name == "extra")
        );
    }
}
