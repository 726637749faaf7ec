//! # Watamak 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与文件选择器注入。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use watamak::error::AppError;
use watamak::report::BatchReport;
use watamak::selector::{DirectorySelector, FileSelector, PathListSelector};
use watamak::storage;
use watamak::watermark::{WatermarkConfig, WatermarkService};

/// 为 PNG / JPEG 图片批量添加半透明文字水印
#[derive(Parser, Debug)]
#[command(name = "watamak")]
#[command(version, about, long_about = None)]
struct Args {
    /// 需要加水印的图片
    #[arg(conflicts_with = "dir")]
    files: Vec<PathBuf>,

    /// 水印文字
    #[arg(short, long, default_value = "My Watermark")]
    text: String,

    /// 处理目录下所有 PNG / JPEG（不递归）
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// 输出目录，默认 ~/WatermarkAppOutput
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 有界并发处理（worker 数见配置 max_workers）
    #[arg(long)]
    concurrent: bool,

    /// 以 JSON 输出结果报告
    #[arg(long)]
    json: bool,

    /// 输出 debug 级别日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(err) = run(args) {
        log::error!("[{}] {}", err.code(), err);
        eprintln!("watamak: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => WatermarkConfig::load_from_path(path)?,
        None => WatermarkConfig::default(),
    };

    let selector: Box<dyn FileSelector> = match args.dir {
        Some(dir) => Box::new(DirectorySelector::new(dir)),
        None => Box::new(PathListSelector::new(args.files)),
    };
    let paths = selector.select()?;
    if paths.is_empty() {
        return Err(AppError::Selection("没有选择任何图片".to_string()));
    }

    let output_dir = match args.output {
        Some(dir) => dir,
        None => storage::default_output_dir()?,
    };

    let service = WatermarkService::with_config(config)?;
    log::info!(
        "🚀 开始处理 {} 张图片 -> {}（并发: {}）",
        paths.len(),
        output_dir.display(),
        args.concurrent
    );

    let started = Instant::now();
    let outputs = if args.concurrent {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(service.process_concurrent(paths, args.text, output_dir.clone()))?
    } else {
        service.process(&paths, &args.text, &output_dir)?
    };

    if args.json {
        let report = BatchReport::new(&outputs, &output_dir, service.watermark_enabled(), started.elapsed())?;
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::Storage(format!("序列化报告失败: {}", e)))?;
        println!("{}", json);
    } else {
        for output in &outputs {
            println!("{}", output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("watamak").chain(args.iter().copied()))
    }

    #[test]
    fn text_defaults_when_not_given() {
        let args = parse(&["a.png", "b.jpg"]).expect("parse");
        assert_eq!(args.text, "My Watermark");
        assert_eq!(args.files, vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]);
        assert!(!args.concurrent);
        assert!(!args.json);
    }

    #[test]
    fn dir_conflicts_with_positional_files() {
        let err = parse(&["a.png", "--dir", "photos"]).err().expect("should conflict");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn empty_directory_is_a_selection_error() {
        let input = TempDir::new().expect("create temp dir failed");
        let output = TempDir::new().expect("create temp dir failed");
        let dir = input.path().to_string_lossy().to_string();
        let out = output.path().to_string_lossy().to_string();

        let args = parse(&["--dir", &dir, "--output", &out]).expect("parse");
        assert!(matches!(run(args), Err(AppError::Selection(_))));
    }

    #[test]
    fn json_run_writes_outputs_into_output_dir() {
        let input = TempDir::new().expect("create temp dir failed");
        let output = TempDir::new().expect("create temp dir failed");
        let source = input.path().join("a.png");
        let img: RgbaImage = ImageBuffer::from_pixel(32, 32, Rgba([10, 20, 30, 255]));
        img.save_with_format(&source, ImageFormat::Png).expect("write test image");

        let src = source.to_string_lossy().to_string();
        let out = output.path().to_string_lossy().to_string();
        let args = parse(&[&src, "--output", &out, "--json", "--text", "hi"]).expect("parse");
        assert_eq!(args.text, "hi");

        run(args).expect("run");
        assert!(output.path().join("watermarked_a.png").is_file());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let input = TempDir::new().expect("create temp dir failed");
        let output = TempDir::new().expect("create temp dir failed");
        let source = input.path().join("b.png");
        let img: RgbaImage = ImageBuffer::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        img.save_with_format(&source, ImageFormat::Png).expect("write test image");

        let src = source.to_string_lossy().to_string();
        let out = output.path().to_string_lossy().to_string();
        let cfg = input.path().join("absent.json").to_string_lossy().to_string();
        let args = parse(&[&src, "-o", &out, "-c", &cfg, "--concurrent"]).expect("parse");

        run(args).expect("run");
        assert!(output.path().join("watermarked_b.png").is_file());
    }
}
