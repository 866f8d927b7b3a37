//! rslabeler CLI
//! 批处理入口：对数据集文件应用/校验规则集，检测规则目录重复，回查规则定义

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rslabeler::{
    AssignmentEngine, Dataset, DuplicateChecker, EngineConfig, RslResult, RuleInspector,
    RuleValidator, normalize_submission,
};

#[derive(Parser)]
#[command(name = "rslabeler", version, about = "规则驱动的表格数据行标注引擎")]
struct Cli {
    /// 规则集目录
    #[arg(long, default_value = "./rulesets")]
    rule_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 应用规则集并输出标注后的数据集（JSON 记录数组到 stdout）
    Run {
        /// 数据集文件（JSON 记录数组）
        #[arg(long)]
        data: PathBuf,
        /// 规则集名称
        #[arg(long)]
        set: String,
        /// 主规则集之后追加应用的规则集名称
        #[arg(long)]
        followup: Option<String>,
    },
    /// 校验规则提交（单个规则对象或对象数组）
    Validate {
        #[arg(long)]
        data: PathBuf,
        /// 规则提交文件
        #[arg(long)]
        rules: PathBuf,
        /// 报告中使用的规则集名称
        #[arg(long, default_value = "submitted")]
        set: String,
    },
    /// 扫描规则集目录中的结构重复规则
    Duplicates,
    /// 按派生标识回查规则定义
    Inspect {
        /// 一个或多个 `<规则集名>_<下标>` 标识
        ids: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> RslResult<()> {
    let config = EngineConfig::with_rule_dir(&cli.rule_dir);

    match cli.command {
        Command::Run { data, set, followup } => {
            let mut config = config;
            if let Some(name) = followup {
                config.followup_set = Some(name);
            }

            let text = fs::read_to_string(&data)?;
            let mut dataset = Dataset::from_json_records(&text)?;

            let engine = AssignmentEngine::new(config);
            let report = engine.process(&mut dataset, &set)?;

            println!("{}", dataset.to_json_records()?);
            log::info!(
                "运行报告 | 规则集: {} | 轮次: {} | 标注行数: {} | 隔离规则数: {}",
                report.set_name,
                report.passes,
                report.assigned_rows,
                report.quarantined.len()
            );
            for quarantined in &report.quarantined {
                for violation in &quarantined.violations {
                    eprintln!("{}", violation);
                }
            }
        }
        Command::Validate { data, rules, set } => {
            let dataset = Dataset::from_json_records(&fs::read_to_string(&data)?)?;
            let submitted = normalize_submission(&fs::read_to_string(&rules)?)?;

            let validator = RuleValidator::from_config(&config);
            let outcome = validator.validate_set(&dataset, &submitted, &set);
            println!("{}", outcome);
        }
        Command::Duplicates => {
            let outcome = DuplicateChecker::from_config(&config).check()?;
            println!("{}", outcome);
        }
        Command::Inspect { ids } => {
            let inspector = RuleInspector::from_config(&config);
            for (id, found) in ids.iter().zip(inspector.inspect_many(&ids)) {
                match found {
                    Some(rule) => println!("{}: {}", id, serde_json::to_string(&rule)?),
                    None => println!("{}: 未找到", id),
                }
            }
        }
    }
    Ok(())
}
