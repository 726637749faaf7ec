//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 在“尽可能早”的阶段执行输入校验：存在性、体积上限、文件签名。
//! 目标是尽快失败，减少不必要的内存与 CPU 消耗。
//!
//! 这里的所有失败都归为解码错误，并携带输入路径，方便批处理直接定位问题文件。

use std::path::Path;

use super::source::RawImageData;
use super::{WatermarkConfig, WatermarkError};

/// 从本地文件读取图片原始字节。
pub(crate) fn load_from_file(
    path: &Path,
    config: &WatermarkConfig,
) -> Result<RawImageData, WatermarkError> {
    log::debug!("📁 开始读取本地图片 - 路径: {}", path.display());

    let metadata = std::fs::metadata(path)
        .map_err(|e| WatermarkError::decode(path, format!("无法读取文件信息：{}", e)))?;

    if !metadata.is_file() {
        return Err(WatermarkError::decode(path, "不是普通文件"));
    }

    if metadata.len() > config.max_file_size {
        return Err(WatermarkError::decode(
            path,
            format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            ),
        ));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| WatermarkError::decode(path, format!("无法读取图片文件：{}", e)))?;
    validate_image_signature(&bytes, path)?;

    Ok(RawImageData {
        bytes,
        path: path.to_path_buf(),
    })
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
pub(crate) fn validate_image_signature(bytes: &[u8], path: &Path) -> Result<(), WatermarkError> {
    if bytes.is_empty() {
        return Err(WatermarkError::decode(path, "图片内容为空"));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| WatermarkError::decode(path, "无法识别图片类型"))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(WatermarkError::decode(
            path,
            format!("文件签名不是图片类型：{}", kind.mime_type()),
        ));
    }

    Ok(())
}

/// 判断字节是否为 PNG 或 JPEG 签名，供文件选择器过滤使用。
pub(crate) fn is_supported_signature(bytes: &[u8]) -> bool {
    matches!(
        infer::get(bytes).map(|kind| kind.mime_type()),
        Some("image/png") | Some("image/jpeg")
    )
}
