//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，入口层（命令行）所有操作统一返回
//! `Result<T, AppError>`，避免各处分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `WatermarkError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，供 `--json` 报告输出。

use serde::Serialize;

use crate::watermark::WatermarkError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 水印流水线错误（解码 / 合成 / 编码 / 目录）
    #[error("{0}")]
    Watermark(#[from] WatermarkError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 输出目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 文件选择失败
    #[error("文件选择失败: {0}")]
    Selection(String),
}

impl AppError {
    /// 稳定错误码，与 `WatermarkError::code` 保持同一命名空间。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Watermark(err) => err.code(),
            Self::Io(_) => "io_failed",
            Self::Storage(_) => "storage_unavailable",
            Self::Selection(_) => "selection_failed",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
