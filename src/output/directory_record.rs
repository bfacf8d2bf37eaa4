// 该文件是 Wuti （物体检测） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Datelike, Local};
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  category::CategoryTable,
  frame::Frame,
  model::DetectResult,
  output::Render,
  url_to_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("输出路径错误: {0}")]
  PathError(String),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 是否在图片旁附带文本记录，以及记录中的类别写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
  ImageOnly,
  WithName,
  WithId,
}

pub struct DirectoryRecordOutput {
  directory: PathBuf,
  mode: RecordMode,
  categories: &'static CategoryTable,
  frame_counter: AtomicU32,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let mode = uri
      .query_pairs()
      .find(|(k, _)| k == "record")
      .map(|(_, v)| {
        if v == "id" {
          RecordMode::WithId
        } else {
          RecordMode::WithName
        }
      })
      .unwrap_or(RecordMode::ImageOnly);

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let directory =
      url_to_path(uri).map_err(|e| DirectoryRecordOutputError::PathError(e.to_string()))?;

    Ok(Self::new(directory).mode(mode).always(always))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl AsRef<Path>) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
      mode: RecordMode::ImageOnly,
      categories: CategoryTable::coco(),
      frame_counter: AtomicU32::new(0),
      always: false,
    }
  }

  pub fn mode(mut self, mode: RecordMode) -> Self {
    self.mode = mode;
    self
  }

  /// 没有检测结果的帧也保存
  pub fn always(mut self, always: bool) -> Self {
    self.always = always;
    self
  }

  pub fn categories(mut self, categories: &'static CategoryTable) -> Self {
    self.categories = categories;
    self
  }

  fn frame_id(&self) -> u32 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// `<dir>/<YYYY>/<MM>/<DD>/<HH-MM-SS>-<计数>.png`
  fn frame_path(&self, now: DateTime<Local>) -> Result<PathBuf, std::io::Error> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  /// 每个检测结果一行：`类别, 置信度, x1, y1, x2, y2`
  fn record_lines(&self, result: &DetectResult) -> Vec<String> {
    result
      .iter()
      .map(|item| {
        let name = match self.mode {
          RecordMode::WithName => self
            .categories
            .lookup(item.class_id)
            .map(str::to_string)
            .unwrap_or_else(|| item.class_id.to_string()),
          _ => item.class_id.to_string(),
        };
        format!(
          "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
          name, item.confidence, item.bbox[0], item.bbox[1], item.bbox[2], item.bbox[3]
        )
      })
      .collect()
  }
}

impl Render<Frame, DetectResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      return Ok(());
    }

    let path = self.frame_path(Local::now())?;
    frame.image.save(&path)?;
    if self.mode != RecordMode::ImageOnly {
      std::fs::write(path.with_extension("txt"), self.record_lines(result).join("\n"))?;
    }
    debug!("帧 {} 已记录到 {}", frame.index, path.display());
    Ok(())
  }
}
