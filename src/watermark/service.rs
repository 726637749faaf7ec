//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `WatermarkService` 作为入口层持有的状态，替代全局字体与全局函数：
//! 1. 字体在构造时加载一次，并按 `FontFailurePolicy` 决定降级还是失败
//! 2. 测试可创建独立实例（甚至注入自定义字体），减少共享状态副作用
//! 3. 处理器放在 `Arc` 中，可直接交给并发工作线程
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `process`：顺序批处理（fail-fast）
//! - `process_concurrent`：有界并发批处理
//! - `set_config` / `config`：运行时配置

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use super::handler::{ensure_output_dir, plan_unique_outputs};
use super::source::WatermarkSpec;
use super::{
    FontAsset, FontFailurePolicy, WatermarkCompositor, WatermarkConfig, WatermarkError,
    WatermarkHandler,
};

/// 水印服务状态。
pub struct WatermarkService {
    handler: Arc<WatermarkHandler>,
}

impl WatermarkService {
    /// 使用打包字体与默认配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use watamak::watermark::WatermarkService;
    ///
    /// let service = WatermarkService::new()?;
    /// let outputs = service.process(&["photo.jpg"], "My Watermark", "out".as_ref())?;
    /// # Ok::<(), watamak::watermark::WatermarkError>(())
    /// ```
    pub fn new() -> Result<Self, WatermarkError> {
        Self::with_config(WatermarkConfig::default())
    }

    /// 使用打包字体与自定义配置创建服务。
    pub fn with_config(config: WatermarkConfig) -> Result<Self, WatermarkError> {
        Self::with_font(FontAsset::embedded(), config)
    }

    /// 使用字体加载结果创建服务。
    ///
    /// 字体加载失败时按 `config.font_failure_policy` 处理：
    /// - `Degrade`：记录警告，之后所有输出为原图副本
    /// - `Fail`：直接返回 `FontLoad` 错误
    pub fn with_font(
        font: Result<FontAsset, WatermarkError>,
        config: WatermarkConfig,
    ) -> Result<Self, WatermarkError> {
        let compositor = match font {
            Ok(font) => WatermarkCompositor::new(font),
            Err(err) => match config.font_failure_policy {
                FontFailurePolicy::Fail => {
                    log::error!("❌ 字体加载失败，按策略终止：{}", err);
                    return Err(err);
                }
                FontFailurePolicy::Degrade => {
                    log::warn!("⚠️ 字体加载失败，本次运行不会添加水印：{}", err);
                    WatermarkCompositor::without_font()
                }
            },
        };

        Ok(Self {
            handler: Arc::new(WatermarkHandler::new(config, compositor)?),
        })
    }

    pub fn watermark_enabled(&self) -> bool {
        self.handler.watermark_enabled()
    }

    pub fn config(&self) -> Result<WatermarkConfig, WatermarkError> {
        self.handler.config_snapshot()
    }

    pub fn set_config(&self, config: WatermarkConfig) -> Result<(), WatermarkError> {
        self.handler.set_config(config)
    }

    /// 顺序批处理，语义见 `WatermarkHandler::run`。
    pub fn process<P: AsRef<Path>>(
        &self,
        paths: &[P],
        text: &str,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, WatermarkError> {
        self.handler.run(paths, text, output_dir)
    }

    /// 有界并发批处理。
    ///
    /// - 输出文件名冲突在开始前即被拒绝
    /// - 任一文件失败后不再启动新文件，已在处理中的文件会完成
    /// - 返回按输入顺序排在最前的错误；全部成功时输出与输入同序
    pub async fn process_concurrent(
        &self,
        paths: Vec<PathBuf>,
        text: String,
        output_dir: PathBuf,
    ) -> Result<Vec<PathBuf>, WatermarkError> {
        let config = Arc::new(self.handler.config_snapshot()?);
        let batch_start = Instant::now();

        let dir = output_dir.clone();
        tokio::task::spawn_blocking(move || ensure_output_dir(&dir))
            .await
            .map_err(|e| WatermarkError::Worker(format!("创建输出目录任务异常退出：{}", e)))??;
        let destinations = plan_unique_outputs(&paths, &output_dir)?;

        let spec = Arc::new(WatermarkSpec::from_config(text, &config));
        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let failed = Arc::new(AtomicBool::new(false));
        let total = paths.len();

        let mut tasks = Vec::with_capacity(total);
        for (input, output) in paths.into_iter().zip(destinations) {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| WatermarkError::Worker(format!("获取并发许可失败：{}", e)))?;

            if failed.load(Ordering::SeqCst) {
                log::warn!("⏹️ 已有文件失败，停止调度剩余文件（从 {} 开始）", input.display());
                break;
            }

            let handler = Arc::clone(&self.handler);
            let spec = Arc::clone(&spec);
            let config = Arc::clone(&config);
            let failed = Arc::clone(&failed);

            tasks.push(tokio::task::spawn_blocking(move || {
                let result = handler.process_to(&input, &output, &spec, &config);
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }
                drop(permit);
                result
            }));
        }

        let mut outputs = Vec::with_capacity(tasks.len());
        let mut first_error: Option<WatermarkError> = None;
        for task in tasks {
            let result = task
                .await
                .unwrap_or_else(|e| Err(WatermarkError::Worker(format!("工作线程异常退出：{}", e))));
            match result {
                Ok(path) => outputs.push(path),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            log::error!("❌ 并发批处理失败 [{}:{}]：{}", err.stage(), err.code(), err);
            return Err(err);
        }

        log::info!(
            "📦 并发批处理完成 - 文件数: {}/{} workers: {} 耗时: {}ms",
            outputs.len(),
            total,
            config.max_workers,
            batch_start.elapsed().as_millis()
        );

        Ok(outputs)
    }
}
