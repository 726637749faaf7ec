//! 文件选择模块
//!
//! # 设计思路
//!
//! 核心流水线不关心“文件从哪里来”。图形界面里的文件对话框、
//! 命令行参数、目录扫描都只是“返回一组路径”的能力，统一抽象为 `FileSelector`，
//! 由入口层注入，核心代码从不直接引用。
//!
//! # 实现思路
//!
//! - `PathListSelector`：原样返回调用方给出的路径（不做校验，交给解码阶段报错）。
//! - `DirectorySelector`：非递归扫描目录，按文件名排序，只保留签名为 PNG / JPEG 的文件。

use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

use crate::error::AppError;
use crate::watermark::is_supported_signature;

/// 签名探测读取的字节数。
const SIGNATURE_PROBE_BYTES: usize = 16;

/// 文件选择能力。
pub trait FileSelector {
    fn select(&self) -> Result<Vec<PathBuf>, AppError>;
}

/// 显式路径列表。
pub struct PathListSelector {
    paths: Vec<PathBuf>,
}

impl PathListSelector {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FileSelector for PathListSelector {
    fn select(&self) -> Result<Vec<PathBuf>, AppError> {
        Ok(self.paths.clone())
    }
}

/// 目录扫描。
pub struct DirectorySelector {
    dir: PathBuf,
}

impl DirectorySelector {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn has_supported_signature(path: &std::path::Path) -> bool {
        let mut probe = [0u8; SIGNATURE_PROBE_BYTES];
        let read = match File::open(path).and_then(|mut f| f.read(&mut probe)) {
            Ok(n) => n,
            Err(err) => {
                log::debug!("🚫 无法读取 {}，跳过：{}", path.display(), err);
                return false;
            }
        };
        is_supported_signature(&probe[..read])
    }
}

impl FileSelector for DirectorySelector {
    fn select(&self) -> Result<Vec<PathBuf>, AppError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            AppError::Selection(format!("无法读取目录 '{}': {}", self.dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let selected: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| {
                let keep = Self::has_supported_signature(path);
                if !keep {
                    log::debug!("🚫 非 PNG / JPEG 文件，跳过：{}", path.display());
                }
                keep
            })
            .collect();

        log::info!("📂 从 {} 选出 {} 张图片", self.dir.display(), selected.len());
        Ok(selected)
    }
}
