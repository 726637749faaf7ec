//! # 编解码模块
//!
//! ## 设计思路
//!
//! 解码时同时恢复像素与格式标签，编码时必须使用同一个标签，禁止跨格式改写。
//! 格式识别只看内容（magic bytes），不看扩展名。
//!
//! ## 实现思路
//!
//! 1. 读取文件并校验签名（`loader`）
//! 2. 猜测格式，只接受 PNG / JPEG
//! 3. 读取 header 尺寸，按像素上限快速拒绝
//! 4. 完整解码并转换为 RGBA8
//!
//! 编码先写入内存缓冲，成功后再一次性写文件；不支持的格式在创建文件前就被拒绝。

use std::io::Cursor;
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage, RgbaImage};

use super::loader::load_from_file;
use super::source::{DecodedImage, RawImageData};
use super::{WatermarkConfig, WatermarkError};

/// JPEG 输出质量，固定策略。
pub const JPEG_QUALITY: u8 = 90;

/// 是否为支持的容器格式。
pub fn is_supported_format(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
}

/// 解码文件为 RGBA 像素与格式标签。
pub fn decode(path: &Path, config: &WatermarkConfig) -> Result<DecodedImage, WatermarkError> {
    let raw = load_from_file(path, config)?;
    decode_raw(raw, config)
}

pub(crate) fn decode_raw(
    raw: RawImageData,
    config: &WatermarkConfig,
) -> Result<DecodedImage, WatermarkError> {
    let path = raw.path.as_path();

    let format = image::guess_format(&raw.bytes)
        .map_err(|e| WatermarkError::decode(path, format!("无法识别图片格式：{}", e)))?;
    if !is_supported_format(format) {
        return Err(WatermarkError::decode(
            path,
            format!("不支持的容器格式：{:?}（仅支持 PNG / JPEG）", format),
        ));
    }

    let (header_width, header_height) = inspect_dimensions(&raw.bytes, format, path)?;
    validate_pixel_limits(config, header_width, header_height, path)?;

    let decoded = image::load_from_memory_with_format(&raw.bytes, format)
        .map_err(|e| WatermarkError::decode(path, format!("图片解码失败：{}", e)))?;
    let pixels = decoded.to_rgba8();

    log::debug!(
        "✅ 图片解码成功 - 路径: {} 格式: {:?} 尺寸: {}x{}",
        path.display(),
        format,
        pixels.width(),
        pixels.height()
    );

    Ok(DecodedImage { pixels, format })
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions(
    bytes: &[u8],
    format: ImageFormat,
    path: &Path,
) -> Result<(u32, u32), WatermarkError> {
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| WatermarkError::decode(path, format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(
    config: &WatermarkConfig,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), WatermarkError> {
    // u32 * u32 总能放进 u64
    let pixels = width as u64 * height as u64;

    if pixels > config.max_decoded_pixels {
        return Err(WatermarkError::ResourceLimit {
            path: path.to_path_buf(),
            cause: format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            ),
        });
    }

    Ok(())
}

/// 将像素编码为指定格式的字节。
pub fn encode_to_vec(
    pixels: &RgbaImage,
    format: ImageFormat,
    path: &Path,
) -> Result<Vec<u8>, WatermarkError> {
    let (width, height) = pixels.dimensions();
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| WatermarkError::encode(path, format!("PNG 编码失败：{}", e)))?,
        ImageFormat::Jpeg => {
            // JPEG 不支持 alpha 通道
            let rgb: RgbImage = pixels.convert();
            JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| WatermarkError::encode(path, format!("JPEG 编码失败：{}", e)))?
        }
        other => {
            return Err(WatermarkError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format!("{:?}", other),
            });
        }
    }

    Ok(buffer)
}

/// 编码并写入目标文件（创建或截断）。
pub fn encode(path: &Path, pixels: &RgbaImage, format: ImageFormat) -> Result<(), WatermarkError> {
    let bytes = encode_to_vec(pixels, format, path)?;
    std::fs::write(path, &bytes)
        .map_err(|e| WatermarkError::encode(path, format!("写入文件失败：{}", e)))?;

    log::debug!(
        "💾 已写入 {} - 格式: {:?} 大小: {}KB",
        path.display(),
        format,
        bytes.len() / 1024
    );
    Ok(())
}
