//! 输出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理水印图片的输出路径：未指定时回退到用户主目录下的固定子目录，
//! 批处理结束后可统计目录占用，供报告输出。
//!
//! # 实现思路
//!
//! - 默认目录为 `$HOME/WatermarkAppOutput`（Windows 回退 `USERPROFILE`）。
//! - 这里只负责“解析路径”，目录创建由批处理自身完成（幂等）。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;

/// 默认输出目录名。
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "WatermarkAppOutput";

/// 输出目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取默认输出目录
///
/// # 返回
/// - `Ok(PathBuf)`：`主目录/WatermarkAppOutput`
/// - `Err(AppError::Storage)`：无法确定主目录
pub fn default_output_dir() -> Result<PathBuf, AppError> {
    let home = env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .or_else(|| env::var_os("USERPROFILE").filter(|v| !v.is_empty()))
        .ok_or_else(|| AppError::Storage("无法确定用户主目录".to_string()))?;

    Ok(PathBuf::from(home).join(DEFAULT_OUTPUT_DIR_NAME))
}

/// 获取输出目录信息（路径 + 占用大小 + 文件数）
pub fn output_dir_info(dir: &Path) -> Result<StorageInfo, AppError> {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if dir.exists() {
        for entry in fs::read_dir(dir)?.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    Ok(StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}
