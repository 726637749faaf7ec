//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载水印链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 与单个文件相关的错误（解码 / 编码）始终携带路径，批处理失败时调用方
//! 只看到一条错误，必须能从中定位出问题的文件。

use std::path::PathBuf;

/// 水印处理统一错误类型。
///
/// 该类型会在入口层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("解码错误：{}：{cause}", .path.display())]
    Decode { path: PathBuf, cause: String },

    #[error("编码错误：{}：{cause}", .path.display())]
    Encode { path: PathBuf, cause: String },

    #[error("编码错误：{}：不支持的输出格式 {format}", .path.display())]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("字体加载错误：{0}")]
    FontLoad(String),

    #[error("目录错误：{}：{cause}", .path.display())]
    Directory { path: PathBuf, cause: String },

    #[error("资源限制：{}：{cause}", .path.display())]
    ResourceLimit { path: PathBuf, cause: String },

    #[error("输出路径冲突：{0}")]
    Collision(String),

    #[error("配置错误：{0}")]
    Config(String),

    #[error("工作线程错误：{0}")]
    Worker(String),
}

impl WatermarkError {
    pub(crate) fn decode(path: impl Into<PathBuf>, cause: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, cause: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    /// 稳定错误码，供日志与 JSON 报告使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode_failed",
            Self::Encode { .. } => "encode_failed",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::FontLoad(_) => "font_load_failed",
            Self::Directory { .. } => "directory_failed",
            Self::ResourceLimit { .. } => "resource_limit",
            Self::Collision(_) => "output_collision",
            Self::Config(_) => "invalid_config",
            Self::Worker(_) => "worker_failed",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Decode { .. } | Self::ResourceLimit { .. } => "decode",
            Self::Encode { .. } | Self::UnsupportedFormat { .. } => "encode",
            Self::FontLoad(_) => "font",
            Self::Directory { .. } | Self::Collision(_) => "prepare",
            Self::Config(_) => "config",
            Self::Worker(_) => "batch",
        }
    }

    /// 与该错误相关的文件路径（若有）。
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::UnsupportedFormat { path, .. }
            | Self::ResourceLimit { path, .. }
            | Self::Directory { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<WatermarkError> for String {
    fn from(error: WatermarkError) -> Self {
        error.to_string()
    }
}
