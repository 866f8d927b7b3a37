//! 表格数据集模型
//! 有序行集合 + 共享列定义，引擎专属列（label / rule_id）按需创建

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::error::{RslResult, RslabelerError};

/// 引擎专属列：分配到的类别标签
pub const LABEL_COLUMN: &str = "label";
/// 引擎专属列：产生标签的规则标识
pub const RULE_ID_COLUMN: &str = "rule_id";
/// 两列的默认值，表示"尚未标注"
pub const UNASSIGNED: &str = "unknown";

/// 表格数据集
/// 设计说明：
/// - rows: 有序行列表，每行为 列名 → 字符串值 的映射
/// - columns: 列名列表，保留首次出现顺序（行映射本身无序）
/// - 单元格统一为字符串；JSON 中的数字/布尔在解码时转为字符串形式
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<FxHashMap<String, String>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按列定义创建空数据集（测试与程序化构造入口）
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 追加一行，值按列定义顺序对应
    pub fn push_row<S: AsRef<str>>(&mut self, values: &[S]) -> RslResult<()> {
        if values.len() != self.columns.len() {
            return Err(RslabelerError::InvalidInput(format!(
                "行字段数 {} 与列数 {} 不一致",
                values.len(),
                self.columns.len()
            )));
        }
        let row = self
            .columns
            .iter()
            .cloned()
            .zip(values.iter().map(|v| v.as_ref().to_string()))
            .collect();
        self.rows.push(row);
        Ok(())
    }

    /// 从 JSON 记录数组（对象数组）解码数据集
    /// 列集合为各行键的并集；标量（数字/布尔）转为字符串，null 转为空串
    pub fn from_json_records(text: &str) -> RslResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        let Value::Array(records) = raw else {
            return Err(RslabelerError::InvalidInput(
                "数据集必须是 JSON 对象数组".to_string(),
            ));
        };

        let mut dataset = Dataset::new();
        for (pos, record) in records.into_iter().enumerate() {
            let Value::Object(fields) = record else {
                return Err(RslabelerError::InvalidInput(format!(
                    "第 {} 条记录不是 JSON 对象",
                    pos
                )));
            };
            let mut row = FxHashMap::default();
            for (key, value) in fields {
                if !dataset.columns.iter().any(|c| c == &key) {
                    dataset.columns.push(key.clone());
                }
                row.insert(key, coerce_cell(value)?);
            }
            dataset.rows.push(row);
        }

        log::debug!(
            "数据集解码完成 | 行数: {} | 列数: {}",
            dataset.rows.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// 编码为 JSON 记录数组，列按列定义顺序输出，缺失单元格补空串
    pub fn to_json_records(&self) -> RslResult<String> {
        let mut records = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut record = Map::new();
            for column in &self.columns {
                let cell = row.get(column).cloned().unwrap_or_default();
                record.insert(column.clone(), Value::String(cell));
            }
            records.push(Value::Object(record));
        }
        Ok(serde_json::to_string(&Value::Array(records))?)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// 读取单元格原始值
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column)).map(|s| s.as_str())
    }

    /// 确保引擎专属列存在；缺失时创建并填充默认值
    pub fn ensure_assignment_columns(&mut self) {
        for column in [LABEL_COLUMN, RULE_ID_COLUMN] {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.insert(column.to_string(), UNASSIGNED.to_string());
                }
            }
        }
    }

    /// 尚未标注的行下标（label 列不存在时视为全部未标注）
    pub fn unassigned_rows(&self) -> Vec<usize> {
        if !self.has_column(LABEL_COLUMN) {
            return (0..self.rows.len()).collect();
        }
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(LABEL_COLUMN).map(|v| v.as_str()) == Some(UNASSIGNED))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// 标注单行：写入标签与规则标识
    pub fn assign(&mut self, row: usize, label: &str, rule_id: &str) {
        if let Some(r) = self.rows.get_mut(row) {
            r.insert(LABEL_COLUMN.to_string(), label.to_string());
            r.insert(RULE_ID_COLUMN.to_string(), rule_id.to_string());
        }
    }
}

/// JSON 标量 → 单元格字符串
fn coerce_cell(value: Value) -> RslResult<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(RslabelerError::InvalidInput(format!(
            "单元格不支持嵌套 JSON 值：{}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_records() {
        let dataset = Dataset::from_json_records(
            r#"[{"host":"web01","port":8080,"tls":true},{"host":"db01","port":5432,"tls":false}]"#,
        )
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.columns(), &["host", "port", "tls"]);
        assert_eq!(dataset.value(0, "port"), Some("8080"));
        assert_eq!(dataset.value(1, "tls"), Some("false"));
    }

    #[test]
    fn test_reject_non_records() {
        assert!(Dataset::from_json_records(r#"{"host":"web01"}"#).is_err());
        assert!(Dataset::from_json_records(r#"[["web01"]]"#).is_err());
        assert!(Dataset::from_json_records(r#"[{"meta":{"a":1}}]"#).is_err());
    }

    #[test]
    fn test_ensure_assignment_columns() {
        let mut dataset = Dataset::with_columns(["host"]);
        dataset.push_row(&["web01"]).unwrap();
        dataset.ensure_assignment_columns();

        assert!(dataset.has_column(LABEL_COLUMN));
        assert!(dataset.has_column(RULE_ID_COLUMN));
        assert_eq!(dataset.value(0, LABEL_COLUMN), Some(UNASSIGNED));
        assert_eq!(dataset.unassigned_rows(), vec![0]);

        // 幂等：重复调用不追加列
        dataset.ensure_assignment_columns();
        assert_eq!(dataset.columns().len(), 3);
    }

    #[test]
    fn test_assign_and_unassigned_rows() {
        let mut dataset = Dataset::with_columns(["host"]);
        dataset.push_row(&["web01"]).unwrap();
        dataset.push_row(&["db01"]).unwrap();
        dataset.ensure_assignment_columns();

        dataset.assign(0, "frontend", "prod_0");
        assert_eq!(dataset.value(0, LABEL_COLUMN), Some("frontend"));
        assert_eq!(dataset.value(0, RULE_ID_COLUMN), Some("prod_0"));
        assert_eq!(dataset.unassigned_rows(), vec![1]);
    }

    #[test]
    fn test_export_round_shape() {
        let mut dataset = Dataset::with_columns(["host", "env"]);
        dataset.push_row(&["web01", "prod"]).unwrap();
        let text = dataset.to_json_records().unwrap();
        // serde_json 对象键按字典序输出
        assert_eq!(text, r#"[{"env":"prod","host":"web01"}]"#);
    }
}
