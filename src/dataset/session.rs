//! 活动数据集会话
//! 显式持有基准数据文件路径与活动数据集，替换全局可变状态；
//! 并发写入的串行化由外层调用方负责

use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::frame::Dataset;
use crate::error::RslResult;

/// 数据集会话
/// 基准数据为 JSON 记录数组文件；replace 换入新数据，reset 回到基准
#[derive(Debug, Clone)]
pub struct DatasetSession {
    base_path: PathBuf,
    active: Dataset,
}

impl DatasetSession {
    /// 打开会话并加载基准数据文件
    pub fn open(base_path: impl Into<PathBuf>) -> RslResult<Self> {
        let base_path = base_path.into();
        let active = Self::load_file(&base_path)?;
        log::info!(
            "数据集会话已打开 | 文件: {} | 行数: {}",
            base_path.display(),
            active.len()
        );
        Ok(Self { base_path, active })
    }

    fn load_file(path: &Path) -> RslResult<Dataset> {
        let text = fs::read_to_string(path)?;
        Dataset::from_json_records(&text)
    }

    /// 以 JSON 文档整体替换活动数据集
    pub fn replace(&mut self, text: &str) -> RslResult<()> {
        self.active = Dataset::from_json_records(text)?;
        log::info!("活动数据集已替换 | 行数: {}", self.active.len());
        Ok(())
    }

    /// 重置为基准数据文件内容
    pub fn reset(&mut self) -> RslResult<()> {
        self.active = Self::load_file(&self.base_path)?;
        log::info!("活动数据集已重置 | 行数: {}", self.active.len());
        Ok(())
    }

    /// 导出活动数据集（JSON 记录数组）
    pub fn export(&self) -> RslResult<String> {
        self.active.to_json_records()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.active
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.active
    }
}
