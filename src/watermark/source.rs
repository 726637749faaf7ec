//! # 数据模型
//!
//! ## 设计思路
//!
//! 将“流水线各阶段的中间结果”显式建模：
//! - `RawImageData` 表示已读取但未解码的字节
//! - `DecodedImage` 表示像素缓冲与解码时识别出的格式标签
//! - `WatermarkSpec` 表示一次调用内不可变的水印参数
//!
//! 像素缓冲直接使用 `image::RgbaImage`，格式标签直接使用 `image::ImageFormat`；
//! 编解码层保证标签只会是 PNG 或 JPEG。

use std::path::PathBuf;

use image::{ImageFormat, Rgba, RgbaImage};

use super::WatermarkConfig;

/// 放置规则：由图片宽高计算文字基线起点。
pub type PlacementRule = fn(u32, u32) -> (i32, i32);

/// 默认放置策略：横向 1/10 处、纵向居中。
///
/// 固定启发式，不分析图片内容。
pub fn left_weighted_center(width: u32, height: u32) -> (i32, i32) {
    ((width / 10) as i32, (height / 2) as i32)
}

/// 加载阶段输出：原始字节与来源路径。
pub(crate) struct RawImageData {
    pub(crate) bytes: Vec<u8>,
    pub(crate) path: PathBuf,
}

/// 解码阶段输出。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// RGBA8 像素缓冲。
    pub pixels: RgbaImage,
    /// 解码时识别出的容器格式，编码时必须原样使用。
    pub format: ImageFormat,
}

/// 单次调用的水印参数。
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub text: String,
    pub font_size_points: f32,
    pub color: Rgba<u8>,
    pub dpi: f32,
    pub placement: PlacementRule,
}

impl WatermarkSpec {
    /// 以配置中的字号 / DPI / 颜色与默认放置规则构建参数。
    pub fn from_config(text: impl Into<String>, config: &WatermarkConfig) -> Self {
        Self {
            text: text.into(),
            font_size_points: config.font_size_points,
            color: Rgba(config.color),
            dpi: config.dpi,
            placement: left_weighted_center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_placement_is_left_weighted_and_centered() {
        assert_eq!(left_weighted_center(1000, 600), (100, 300));
        assert_eq!(left_weighted_center(9, 1), (0, 0));
    }

    #[test]
    fn spec_from_config_uses_reference_policy() {
        let spec = WatermarkSpec::from_config("My Watermark", &WatermarkConfig::default());
        assert_eq!(spec.text, "My Watermark");
        assert_eq!(spec.color, Rgba([255, 255, 255, 80]));
        assert_eq!((spec.placement)(200, 100), (20, 50));
    }
}
