//! # 水印合成模块
//!
//! ## 设计思路
//!
//! 合成是纯函数：从源缓冲派生一个新缓冲，源图始终不被修改。
//! 字体句柄在构造时注入；若上游字体加载失败（句柄为空），
//! 合成器退化为“原样复制 + 警告日志”，不让整条流水线失败。
//!
//! ## 实现思路
//!
//! 1. 复制源像素到新缓冲
//! 2. 按字号 / DPI 光栅化文字
//! 3. 由放置规则计算基线起点（默认 `x = width/10, y = height/2`）
//! 4. 对每个被覆盖像素执行 source-over 混合：
//!    `dst = src * a + dst * (1 - a)`，其中 `a = 颜色 alpha * 覆盖率`
//!
//! 只有覆盖率大于 0 的像素会被写入，其余像素与源图逐位一致。

use image::{Rgba, RgbaImage};

use super::font::{FontAsset, GlyphRun};
use super::source::WatermarkSpec;

/// 文字水印合成器。
#[derive(Debug, Clone)]
pub struct WatermarkCompositor {
    font: Option<FontAsset>,
}

impl WatermarkCompositor {
    pub fn new(font: FontAsset) -> Self {
        Self { font: Some(font) }
    }

    /// 构建一个没有字体的合成器，`apply` 只返回源图副本。
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// 返回加了水印的新缓冲，源缓冲不变。
    pub fn apply(&self, source: &RgbaImage, spec: &WatermarkSpec) -> RgbaImage {
        match &self.font {
            Some(font) => composite_text(source, font, spec),
            None => {
                log::warn!("⚠️ 字体不可用，跳过水印：输出为原图副本");
                source.clone()
            }
        }
    }
}

/// 将文字合成到源图的副本上。
pub fn composite_text(source: &RgbaImage, font: &FontAsset, spec: &WatermarkSpec) -> RgbaImage {
    let mut target = source.clone();

    let run = font.rasterize_glyph_run(&spec.text, spec.font_size_points, spec.dpi);
    if run.is_empty() {
        return target;
    }

    let anchor = (spec.placement)(source.width(), source.height());
    draw_glyph_run(&mut target, &run, anchor, spec.color);
    target
}

/// 在 `anchor`（基线起点）处绘制字形，超出画布的部分被裁剪。
fn draw_glyph_run(target: &mut RgbaImage, run: &GlyphRun, anchor: (i32, i32), color: Rgba<u8>) {
    let width = target.width() as i64;
    let height = target.height() as i64;
    let color_alpha = color[3] as f32 / 255.0;

    for glyph in &run.glyphs {
        for (gx, gy, coverage) in glyph.covered_pixels() {
            let x = anchor.0 as i64 + gx as i64;
            let y = anchor.1 as i64 + gy as i64;
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }

            let alpha = color_alpha * coverage;
            if alpha <= 0.0 {
                continue;
            }

            let pixel = target.get_pixel_mut(x as u32, y as u32);
            *pixel = blend_over(*pixel, color, alpha);
        }
    }
}

/// Source-over 混合，`alpha` 为已乘覆盖率的前景不透明度。
pub fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |fg: u8, bg: u8| -> u8 {
        (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8
    };

    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = alpha + bg_alpha * (1.0 - alpha);

    Rgba([
        mix(foreground[0], background[0]),
        mix(foreground[1], background[1]),
        mix(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::source::left_weighted_center;
    use image::ImageBuffer;
    use proptest::prelude::*;

    fn font() -> FontAsset {
        FontAsset::embedded().expect("embedded font should parse")
    }

    fn checker(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([20, 40, 60, 255])
            } else {
                Rgba([200, 180, 160, 255])
            }
        })
    }

    fn spec(text: &str, size: f32) -> WatermarkSpec {
        WatermarkSpec {
            text: text.to_string(),
            font_size_points: size,
            color: Rgba([255, 255, 255, 80]),
            dpi: 72.0,
            placement: left_weighted_center,
        }
    }

    /// 文字在图像坐标系下的包围盒。
    fn text_region(source: &RgbaImage, spec: &WatermarkSpec) -> Option<(i64, i64, i64, i64)> {
        let run = font().rasterize_glyph_run(&spec.text, spec.font_size_points, spec.dpi);
        let (x0, y0, x1, y1) = run.bounds()?;
        let (ax, ay) = (spec.placement)(source.width(), source.height());
        Some((
            (ax + x0) as i64,
            (ay + y0) as i64,
            (ax + x1) as i64,
            (ay + y1) as i64,
        ))
    }

    #[test]
    fn blend_over_opaque_background_matches_formula() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 80]), 80.0 / 255.0);
        assert_eq!(out, Rgba([80, 80, 80, 255]));
    }

    #[test]
    fn blend_over_with_zero_alpha_is_identity() {
        let bg = Rgba([12, 34, 56, 78]);
        assert_eq!(blend_over(bg, Rgba([255, 255, 255, 255]), 0.0), bg);
    }

    #[test]
    fn blend_over_transparent_background_gains_alpha() {
        let out = blend_over(Rgba([0, 0, 0, 0]), Rgba([255, 255, 255, 80]), 0.5);
        assert_eq!(out[3], 128);
    }

    #[test]
    fn apply_leaves_source_untouched_and_brightens_text_area() {
        let source = checker(200, 100);
        let snapshot = source.clone();
        let spec = spec("Hello", 24.0);

        let out = WatermarkCompositor::new(font()).apply(&source, &spec);

        assert_eq!(source, snapshot);
        assert_eq!(out.dimensions(), source.dimensions());
        assert_ne!(out, source);

        let brighter = out
            .pixels()
            .zip(source.pixels())
            .filter(|(o, s)| o[0] > s[0])
            .count();
        assert!(brighter > 0);
        assert!(out.pixels().zip(source.pixels()).all(|(o, s)| o[0] >= s[0]));
    }

    #[test]
    fn text_starts_near_the_anchor() {
        let source = checker(400, 200);
        let spec = spec("W", 24.0);
        let out = composite_text(&source, &font(), &spec);

        let changed_x: Vec<u32> = out
            .enumerate_pixels()
            .zip(source.pixels())
            .filter(|((_, _, o), s)| o != s)
            .map(|((x, _, _), _)| x)
            .collect();
        let min_x = *changed_x.iter().min().expect("some pixels change");
        assert!((38..=44).contains(&min_x), "min_x was {}", min_x);
    }

    #[test]
    fn missing_font_degrades_to_copy() {
        let source = checker(32, 32);
        let compositor = WatermarkCompositor::without_font();
        assert!(!compositor.has_font());
        assert_eq!(compositor.apply(&source, &spec("Hello", 24.0)), source);
    }

    #[test]
    fn text_outside_canvas_is_clipped() {
        let source = checker(10, 10);
        let mut spec = spec("Clipped", 48.0);
        spec.placement = |_, _| (-500, -500);
        assert_eq!(composite_text(&source, &font(), &spec), source);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn empty_text_is_pixel_identical(width in 1u32..64, height in 1u32..64) {
            let source = checker(width, height);
            let out = composite_text(&source, &font(), &spec("", 48.0));
            prop_assert_eq!(out, source);
        }

        #[test]
        fn pixels_outside_text_region_are_bit_identical(
            width in 20u32..160,
            height in 20u32..120,
            text in "[A-Za-z0-9 ]{1,8}",
        ) {
            let source = checker(width, height);
            let spec = spec(&text, 12.0);
            let out = composite_text(&source, &font(), &spec);

            match text_region(&source, &spec) {
                None => prop_assert_eq!(out, source),
                Some((x0, y0, x1, y1)) => {
                    for (x, y, pixel) in out.enumerate_pixels() {
                        let (x, y) = (x as i64, y as i64);
                        let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
                        if !inside {
                            prop_assert_eq!(pixel, source.get_pixel(x as u32, y as u32));
                        }
                    }
                }
            }
        }
    }
}
