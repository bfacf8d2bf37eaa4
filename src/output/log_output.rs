// 该文件是 Wuti （物体检测） 项目的一部分。
// src/output/log_output.rs - 日志输出
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

use std::convert::Infallible;

use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  category::CategoryTable,
  frame::Frame,
  model::DetectResult,
  output::Render,
};

/// 未指定输出时使用：只把检测结果写进日志
pub struct LogOutput {
  categories: &'static CategoryTable,
}

impl Default for LogOutput {
  fn default() -> Self {
    Self {
      categories: CategoryTable::coco(),
    }
  }
}

impl LogOutput {
  pub fn with_categories(categories: &'static CategoryTable) -> Self {
    Self { categories }
  }

  /// 单个检测结果的文字描述
  pub fn describe(&self, result: &DetectResult) -> Vec<String> {
    result
      .iter()
      .map(|det| {
        let name = self.categories.lookup(det.class_id).unwrap_or("unknown");
        let [x1, y1, x2, y2] = det.bbox;
        format!(
          "{}: {:.2}% at ({:.0}, {:.0}, {:.0}, {:.0})",
          name,
          det.confidence * 100.0,
          x1,
          y1,
          x2,
          y2
        )
      })
      .collect()
  }
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = Infallible;

  fn from_url(_url: &Url) -> Result<Self, Self::Error> {
    Ok(Self::default())
  }
}

impl Render<Frame, DetectResult> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
    if result.is_empty() {
      debug!("帧 {}: 未检测到对象", frame.index);
      return Ok(());
    }

    info!(
      "帧 {} (时间: {}ms): 检测到 {} 个对象",
      frame.index,
      frame.timestamp_ms,
      result.len()
    );
    for line in self.describe(result) {
      info!("  - {}", line);
    }
    Ok(())
  }
}
