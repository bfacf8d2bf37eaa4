// 该文件是 Wuti （物体检测） 项目的一部分。
// src/logging.rs - 日志初始化
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing_subscriber::{
  Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Error, Debug)]
pub enum LoggingError {
  #[error("无法创建日志文件 {path}: {source}")]
  LogFile {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("日志系统已初始化: {0}")]
  AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
  pub level: LevelFilter,
  /// 日志文件目录；`None` 时只输出到控制台
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: LevelFilter::INFO,
      directory: None,
    }
  }
}

/// 按日期命名的日志文件：`YYYY-MM-DD.log`
pub fn log_file_name(date: NaiveDate) -> String {
  format!("{}.log", date.format("%Y-%m-%d"))
}

fn open_log_file(directory: &Path) -> Result<(PathBuf, std::fs::File), LoggingError> {
  let path = directory.join(log_file_name(Local::now().date_naive()));
  std::fs::create_dir_all(directory)
    .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
    .map(|file| (path.clone(), file))
    .map_err(|source| LoggingError::LogFile { path, source })
}

/// 初始化全局日志，返回日志文件路径（若有）
pub fn init(config: LogConfig) -> Result<Option<PathBuf>, LoggingError> {
  let console = fmt::layer().with_filter(config.level);

  let (path, file_layer) = match config.directory.as_deref() {
    Some(directory) => {
      let (path, file) = open_log_file(directory)?;
      let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .with_filter(config.level);
      (Some(path), Some(layer))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(console)
    .with(file_layer)
    .try_init()?;

  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_name_is_dated() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
    assert_eq!(log_file_name(date), "2026-03-07.log");
  }

  #[test]
  fn log_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("logs");
    let (path, _file) = open_log_file(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(path.parent(), Some(nested.as_path()));
    assert!(path.extension().is_some_and(|e| e == "log"));
  }

  #[test]
  fn default_level_is_info() {
    let config = LogConfig::default();
    assert_eq!(config.level, LevelFilter::INFO);
    assert!(config.directory.is_none());
  }
}
