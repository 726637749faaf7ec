//! # 配置模块
//!
//! ## 设计思路
//!
//! 将水印的“固定策略”集中到 `WatermarkConfig`：字号、DPI、颜色与输入上限。
//! 放置规则与 JPEG 质量不在此处暴露，它们是策略常量而非可组合参数。
//!
//! ## 实现思路
//!
//! - `Default` 给出参考策略（48pt @ 300DPI，白色 alpha=80）。
//! - 支持从 JSON 文件读取，缺失字段回退默认值，文件不存在时整体回退默认。
//! - `FontFailurePolicy` 负责字体加载失败时“降级 / 失败”两种语义的解析与输出。
//! - `validate` 在配置进入处理器前做范围校验。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::WatermarkError;

/// 字体加载失败时的处理策略。
///
/// - `Degrade`：记录警告，输出未加水印的副本
/// - `Fail`：直接报错，不处理任何文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFailurePolicy {
    Degrade,
    Fail,
}

impl FontFailurePolicy {
    /// 从外部字符串解析策略。
    ///
    /// # 示例
    /// ```rust
    /// use watamak::watermark::FontFailurePolicy;
    ///
    /// let p = FontFailurePolicy::from_str("fail")?;
    /// assert_eq!(p.as_str(), "fail");
    /// # Ok::<(), watamak::watermark::WatermarkError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(policy: &str) -> Result<Self, WatermarkError> {
        match policy.trim().to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "fail" => Ok(Self::Fail),
            other => Err(WatermarkError::Config(format!(
                "未知字体失败策略：{}（可选：degrade / fail）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::Fail => "fail",
        }
    }
}

/// 水印处理配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// 文字字号（磅）。
    pub font_size_points: f32,
    /// 光栅化分辨率。
    pub dpi: f32,
    /// 文字颜色 RGBA，alpha 决定半透明程度。
    pub color: [u8; 4],
    /// 读取原始字节前允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码前按文件头尺寸判断的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 字体加载失败时的策略。
    pub font_failure_policy: FontFailurePolicy,
    /// 并发模式下同时处理的文件数上限。
    pub max_workers: usize,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_size_points: 48.0,
            dpi: 300.0,
            color: [255, 255, 255, 80],
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 100_000_000,
            font_failure_policy: FontFailurePolicy::Degrade,
            max_workers: 4,
        }
    }
}

impl WatermarkConfig {
    /// 从 JSON 文件加载配置。
    ///
    /// 文件不存在时返回默认配置；文件存在但无法解析时报错，
    /// 避免用户以为自定义配置已生效。
    pub fn load_from_path(path: &Path) -> Result<Self, WatermarkError> {
        if !path.exists() {
            log::debug!("配置文件不存在，使用默认配置：{}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WatermarkError::Config(format!("读取配置文件 '{}' 失败：{}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            WatermarkError::Config(format!("解析配置文件 '{}' 失败：{}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !(self.font_size_points > 0.0 && self.font_size_points <= 1000.0) {
            return Err(WatermarkError::Config(format!(
                "font_size_points 必须在 (0, 1000] 之间，当前：{}",
                self.font_size_points
            )));
        }
        if !(36.0..=1200.0).contains(&self.dpi) {
            return Err(WatermarkError::Config(format!(
                "dpi 必须在 36~1200 之间，当前：{}",
                self.dpi
            )));
        }
        if !(1..=64).contains(&self.max_workers) {
            return Err(WatermarkError::Config(format!(
                "max_workers 必须在 1~64 之间，当前：{}",
                self.max_workers
            )));
        }
        if self.max_decoded_pixels == 0 || self.max_file_size == 0 {
            return Err(WatermarkError::Config(
                "max_decoded_pixels 与 max_file_size 不能为 0".to_string(),
            ));
        }
        Ok(())
    }
}
