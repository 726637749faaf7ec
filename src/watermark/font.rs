//! # 字体光栅化模块
//!
//! ## 设计思路
//!
//! 字体在进程启动时解析一次，之后只读共享。`FontAsset` 内部是 `ab_glyph::FontArc`，
//! 克隆只增加引用计数，可以安全地在多个线程间传递。
//!
//! 字体句柄由调用方显式注入合成器，不使用模块级全局状态，
//! 测试可以直接构造自己的字体实例。
//!
//! ## 实现思路
//!
//! 1. `points * dpi / 72` 得到每 em 像素数，再换算成 `ab_glyph` 的 `PxScale`
//!    （`PxScale` 以字体 ascent-descent 高度为单位）。
//! 2. 单行排版：依次累加 advance 与 kerning，不换行、不做字体回退。
//! 3. 每个字形输出覆盖率掩码，坐标以基线起点为原点。

use std::fmt;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};

use super::WatermarkError;

/// 编译期打包的默认字体（DejaVu Sans）。
pub const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// 已解析、不可变的字体。
#[derive(Clone)]
pub struct FontAsset {
    font: FontArc,
}

impl fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontAsset")
            .field("glyph_count", &self.font.glyph_count())
            .field("units_per_em", &self.font.units_per_em())
            .finish()
    }
}

/// 单个字形的覆盖率掩码。
///
/// `left` / `top` 为掩码左上角相对基线起点的偏移，`top` 通常为负（位于基线之上）。
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    coverage: Vec<f32>,
}

impl RasterizedGlyph {
    /// 遍历覆盖率大于 0 的像素，返回相对基线起点的坐标。
    pub fn covered_pixels(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        self.coverage.iter().enumerate().filter_map(move |(idx, &c)| {
            if c <= 0.0 {
                return None;
            }
            let x = (idx as u32 % self.width) as i32 + self.left;
            let y = (idx as u32 / self.width) as i32 + self.top;
            Some((x, y, c))
        })
    }
}

/// 一行文字的光栅化结果。
#[derive(Debug, Clone, Default)]
pub struct GlyphRun {
    pub glyphs: Vec<RasterizedGlyph>,
    /// 整行的水平前进量（像素）。
    pub advance: f32,
}

impl GlyphRun {
    /// 没有任何可见像素（空文本或全是空白字符）。
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// 所有可见像素的包围盒 `(min_x, min_y, max_x, max_y)`，右下为开区间。
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        self.glyphs.iter().fold(None, |acc, g| {
            let right = g.left + g.width as i32;
            let bottom = g.top + g.height as i32;
            Some(match acc {
                None => (g.left, g.top, right, bottom),
                Some((x0, y0, x1, y1)) => (x0.min(g.left), y0.min(g.top), x1.max(right), y1.max(bottom)),
            })
        })
    }
}

impl FontAsset {
    /// 解析 TrueType / OpenType 字体字节。
    pub fn load(bytes: Vec<u8>) -> Result<Self, WatermarkError> {
        FontArc::try_from_vec(bytes)
            .map(|font| Self { font })
            .map_err(|e| WatermarkError::FontLoad(e.to_string()))
    }

    /// 解析静态生命周期的字体字节（避免复制打包资源）。
    pub fn load_static(bytes: &'static [u8]) -> Result<Self, WatermarkError> {
        FontArc::try_from_slice(bytes)
            .map(|font| Self { font })
            .map_err(|e| WatermarkError::FontLoad(e.to_string()))
    }

    /// 加载打包的默认字体。
    pub fn embedded() -> Result<Self, WatermarkError> {
        Self::load_static(EMBEDDED_FONT)
    }

    /// 将“每 em 像素数”换算为 `PxScale`。
    fn px_scale(&self, pixels_per_em: f32) -> PxScale {
        match self.font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                PxScale::from(pixels_per_em * self.font.height_unscaled() / units_per_em)
            }
            _ => PxScale::from(pixels_per_em),
        }
    }

    /// 光栅化单行文字。
    ///
    /// 字号单位为磅，像素尺寸为 `size_points * dpi / 72`。
    pub fn rasterize_glyph_run(&self, text: &str, size_points: f32, dpi: f32) -> GlyphRun {
        let scale = self.px_scale(size_points * dpi / 72.0);
        let scaled_font = self.font.as_scaled(scale);

        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor_x = 0.0f32;
        let mut prev_glyph: Option<GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled_font.glyph_id(c);

            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, 0.0));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let width = bounds.width().max(0.0) as u32;
                let height = bounds.height().max(0.0) as u32;
                let mut coverage = vec![0.0f32; (width as usize) * (height as usize)];

                outlined.draw(|px, py, c| {
                    if px < width && py < height {
                        coverage[(py * width + px) as usize] = c.clamp(0.0, 1.0);
                    }
                });

                glyphs.push(RasterizedGlyph {
                    left: bounds.min.x.floor() as i32,
                    top: bounds.min.y.floor() as i32,
                    width,
                    height,
                    coverage,
                });
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }

        GlyphRun {
            glyphs,
            advance: cursor_x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontAsset {
        FontAsset::embedded().expect("embedded font should parse")
    }

    #[test]
    fn rejects_non_font_bytes() {
        let result = FontAsset::load(b"definitely not a font".to_vec());
        assert!(matches!(result, Err(WatermarkError::FontLoad(_))));
    }

    #[test]
    fn empty_text_produces_empty_run() {
        let run = font().rasterize_glyph_run("", 48.0, 300.0);
        assert!(run.is_empty());
        assert!(run.bounds().is_none());
        assert_eq!(run.advance, 0.0);
    }

    #[test]
    fn whitespace_advances_without_coverage() {
        let run = font().rasterize_glyph_run("   ", 12.0, 72.0);
        assert!(run.is_empty());
        assert!(run.advance > 0.0);
    }

    #[test]
    fn glyphs_sit_on_the_baseline_left_to_right() {
        let run = font().rasterize_glyph_run("Hi!", 12.0, 72.0);
        assert_eq!(run.glyphs.len(), 3);

        let lefts: Vec<i32> = run.glyphs.iter().map(|g| g.left).collect();
        assert!(lefts.windows(2).all(|w| w[0] < w[1]));

        let (_, min_y, _, max_y) = run.bounds().expect("visible glyphs");
        assert!(min_y < 0, "capital letters rise above the baseline");
        assert!(max_y <= 2, "no descenders in 'Hi!'");
    }

    #[test]
    fn dpi_scales_the_run() {
        let f = font();
        let small = f.rasterize_glyph_run("Watermark", 12.0, 72.0);
        let large = f.rasterize_glyph_run("Watermark", 12.0, 144.0);
        let ratio = large.advance / small.advance;
        assert!((ratio - 2.0).abs() < 0.05, "ratio was {}", ratio);
    }

    #[test]
    fn em_size_matches_points_and_dpi() {
        // 'M' in DejaVu Sans is roughly 0.73 em tall.
        let run = font().rasterize_glyph_run("M", 72.0, 72.0);
        let glyph = &run.glyphs[0];
        assert!((48..=58).contains(&glyph.height), "height was {}", glyph.height);
    }

    #[test]
    fn covered_pixels_are_offset_by_glyph_origin() {
        let run = font().rasterize_glyph_run("I", 24.0, 72.0);
        let glyph = &run.glyphs[0];
        for (x, y, c) in glyph.covered_pixels() {
            assert!(x >= glyph.left && x < glyph.left + glyph.width as i32);
            assert!(y >= glyph.top && y < glyph.top + glyph.height as i32);
            assert!(c > 0.0 && c <= 1.0);
        }
        assert!(glyph.covered_pixels().count() > 0);
    }
}
