//! 批处理结果报告
//!
//! `--json` 模式下输出的结构化结果，字段保持稳定，供脚本消费。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;
use crate::storage::output_dir_info;

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outputs: Vec<String>,
    pub output_dir: String,
    pub total_bytes: u64,
    pub file_count: u64,
    pub watermark_applied: bool,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn new(
        outputs: &[PathBuf],
        output_dir: &Path,
        watermark_applied: bool,
        elapsed: Duration,
    ) -> Result<Self, AppError> {
        let info = output_dir_info(output_dir)?;
        Ok(Self {
            outputs: outputs
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            output_dir: info.path,
            total_bytes: info.total_size,
            file_count: info.file_count,
            watermark_applied,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}
