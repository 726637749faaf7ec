//! # Watamak 批量文字水印工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  入口 (main.rs / clap)                    │
//! │                                                          │
//! │  FileSelector ── WatermarkConfig (JSON) ── BatchReport   │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<Vec<PathBuf>, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            核心 (watermark)                      │
//! │                                                          │
//! │  service ── 字体加载 + 失败策略 / 顺序 · 并发批处理      │
//! │     └─ handler ── decode → composite → encode（fail-fast）│
//! │          ├─ codec       PNG / JPEG 识别与同格式编码       │
//! │          ├─ font        ab_glyph 单行光栅化               │
//! │          └─ compositor  source-over 半透明文字            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，入口层所有操作的返回类型 |
//! | [`watermark`] | 解码、文字合成、同格式编码与批处理编排 |
//! | [`selector`] | 文件选择能力（路径列表 / 目录扫描） |
//! | [`storage`] | 默认输出目录与目录占用统计 |
//! | [`report`] | `--json` 批处理报告 |

pub mod error;
pub mod report;
pub mod selector;
pub mod storage;
pub mod watermark;
