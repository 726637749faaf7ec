//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `WatermarkHandler` 只负责流程编排与配置管理，不关心文件从哪里选出来。
//! 单个文件的处理链路固定为：
//! 1. 读取配置快照
//! 2. 解码（像素 + 格式标签）
//! 3. 合成文字水印（新缓冲，源图不变）
//! 4. 以原格式编码到 `输出目录/watermarked_<文件名>`
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<WatermarkConfig>>` 支持运行时替换。
//! - 单次批处理内使用“同一配置快照”，避免处理中途配置漂移。
//! - 批处理采用 fail-fast：第一个失败立即中止，不返回部分结果，
//!   已写出的文件不会回滚（非原子，调用方需知晓）。
//! - 记录 `decode/composite/encode/total` 阶段耗时，便于性能诊断。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::codec;
use super::source::WatermarkSpec;
use super::{WatermarkCompositor, WatermarkConfig, WatermarkError};

/// 输出文件名前缀。
pub const OUTPUT_PREFIX: &str = "watermarked_";

/// 水印处理器。
pub struct WatermarkHandler {
    pub(super) config: Arc<RwLock<WatermarkConfig>>,
    compositor: WatermarkCompositor,
}

impl WatermarkHandler {
    /// 根据初始配置与合成器创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use watamak::watermark::{FontAsset, WatermarkCompositor, WatermarkConfig, WatermarkHandler};
    ///
    /// let compositor = WatermarkCompositor::new(FontAsset::embedded()?);
    /// let handler = WatermarkHandler::new(WatermarkConfig::default(), compositor)?;
    /// assert!(handler.watermark_enabled());
    /// # Ok::<(), watamak::watermark::WatermarkError>(())
    /// ```
    pub fn new(config: WatermarkConfig, compositor: WatermarkCompositor) -> Result<Self, WatermarkError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            compositor,
        })
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<WatermarkConfig, WatermarkError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| WatermarkError::Config("配置读取锁已中毒".to_string()))
    }

    /// 校验并替换配置，之后开始的批处理生效。
    pub fn set_config(&self, config: WatermarkConfig) -> Result<(), WatermarkError> {
        config.validate()?;
        let mut current = self
            .config
            .write()
            .map_err(|_| WatermarkError::Config("配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 已更新水印配置（size={}pt, dpi={}, color={:?}, font_policy={}, workers={}）",
            config.font_size_points,
            config.dpi,
            config.color,
            config.font_failure_policy.as_str(),
            config.max_workers
        );
        *current = config;
        Ok(())
    }

    /// 字体是否可用（否则输出为原图副本）。
    pub fn watermark_enabled(&self) -> bool {
        self.compositor.has_font()
    }

    /// 处理单个文件到指定输出路径。
    pub fn process_to(
        &self,
        input: &Path,
        output: &Path,
        spec: &WatermarkSpec,
        config: &WatermarkConfig,
    ) -> Result<PathBuf, WatermarkError> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let decoded = codec::decode(input, config)?;
        let decode_elapsed = decode_start.elapsed();

        let composite_start = Instant::now();
        let watermarked = self.compositor.apply(&decoded.pixels, spec);
        drop(decoded.pixels);
        let composite_elapsed = composite_start.elapsed();

        let encode_start = Instant::now();
        codec::encode(output, &watermarked, decoded.format)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ {} -> {} - decode={}ms composite={}ms encode={}ms total={}ms",
            input.display(),
            output.display(),
            decode_elapsed.as_millis(),
            composite_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(output.to_path_buf())
    }

    /// 批处理：按输入顺序逐个处理，第一个错误即中止。
    ///
    /// 成功时返回与输入等长、同序的输出路径。
    pub fn run<P: AsRef<Path>>(
        &self,
        paths: &[P],
        text: &str,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, WatermarkError> {
        let config = self.config_snapshot()?;
        let spec = WatermarkSpec::from_config(text, &config);
        let batch_start = Instant::now();

        ensure_output_dir(output_dir)?;

        let mut outputs = Vec::with_capacity(paths.len());
        for (index, input) in paths.iter().enumerate() {
            let input = input.as_ref();
            let output = output_path_for(input, output_dir)?;

            if let Err(err) = self.process_to(input, &output, &spec, &config) {
                log::error!(
                    "❌ 批处理中止于第 {}/{} 个文件 [{}:{}]：{}",
                    index + 1,
                    paths.len(),
                    err.stage(),
                    err.code(),
                    err
                );
                return Err(err);
            }
            outputs.push(output);
        }

        log::info!(
            "📦 批处理完成 - 文件数: {} 输出目录: {} 耗时: {}ms",
            outputs.len(),
            output_dir.display(),
            batch_start.elapsed().as_millis()
        );

        Ok(outputs)
    }
}

/// 确保输出目录存在；目录已存在不视为错误。
pub fn ensure_output_dir(output_dir: &Path) -> Result<(), WatermarkError> {
    fs::create_dir_all(output_dir).map_err(|e| WatermarkError::Directory {
        path: output_dir.to_path_buf(),
        cause: e.to_string(),
    })
}

/// 计算输出路径：`输出目录/watermarked_<原文件名>`。
pub fn output_path_for(input: &Path, output_dir: &Path) -> Result<PathBuf, WatermarkError> {
    let file_name = input
        .file_name()
        .ok_or_else(|| WatermarkError::decode(input, "路径不包含文件名"))?;

    let mut name = std::ffi::OsString::from(OUTPUT_PREFIX);
    name.push(file_name);
    Ok(output_dir.join(name))
}

/// 为整批输入计算输出路径，文件名冲突时报错。
///
/// 顺序模式下冲突是“后写覆盖”，并发模式下必须提前拒绝。
pub fn plan_unique_outputs<P: AsRef<Path>>(
    paths: &[P],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, WatermarkError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::with_capacity(paths.len());
    let mut outputs = Vec::with_capacity(paths.len());

    for input in paths {
        let input = input.as_ref();
        let output = output_path_for(input, output_dir)?;
        if let Some(previous) = seen.insert(output.clone(), input) {
            return Err(WatermarkError::Collision(format!(
                "{} 与 {} 都会写入 {}",
                previous.display(),
                input.display(),
                output.display()
            )));
        }
        outputs.push(output);
    }

    Ok(outputs)
}
