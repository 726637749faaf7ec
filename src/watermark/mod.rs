//! # 水印处理模块（watermark）
//!
//! ## 设计思路
//!
//! 该模块将“读取校验 → 解码 → 文字合成 → 原格式编码 → 批处理编排”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：承载可注入状态（`WatermarkService`），决定字体失败策略
//! - `handler`：编排单文件流水线与顺序批处理
//! - `loader`：负责本地文件读取与签名校验
//! - `codec`：负责解码（像素 + 格式标签）与同格式编码
//! - `font`：负责字体解析与单行文字光栅化
//! - `compositor`：负责 source-over 文字合成
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! main.rs（参数解析、文件选择）
//!    ↓
//! service.rs（字体加载 + 策略、顺序 / 并发入口）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ codec.rs::decode（loader 校验 → 格式识别 → 像素上限 → RGBA）
//!    ├─ compositor.rs（font 光栅化 → 放置规则 → source-over）
//!    └─ codec.rs::encode（PNG / JPEG q=90）
//!    ↓
//! 返回输出路径列表或第一个错误
//! ```
//!
//! ## 分层职责建议
//!
//! - 策略参数变更优先改 `config.rs`
//! - 批处理失败语义变更优先改 `handler.rs` / `service.rs`
//! - 单阶段行为优化分别改 `codec/font/compositor`

mod codec;
mod compositor;
mod config;
mod error;
mod font;
mod handler;
mod loader;
mod service;
mod source;

pub use codec::{decode, encode, encode_to_vec, is_supported_format, JPEG_QUALITY};
pub use compositor::{blend_over, composite_text, WatermarkCompositor};
pub use config::{FontFailurePolicy, WatermarkConfig};
pub use error::WatermarkError;
pub use font::{FontAsset, GlyphRun, RasterizedGlyph, EMBEDDED_FONT};
pub use handler::{ensure_output_dir, output_path_for, plan_unique_outputs, WatermarkHandler, OUTPUT_PREFIX};
pub use service::WatermarkService;
pub use source::{left_weighted_center, DecodedImage, PlacementRule, WatermarkSpec};

pub(crate) use loader::is_supported_signature;
