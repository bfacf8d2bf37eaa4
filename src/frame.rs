// 该文件是 Wuti （物体检测） 项目的一部分。
// src/frame.rs - 帧定义
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

use image::RgbImage;

/// 一帧图像及其序号
#[derive(Debug, Clone)]
pub struct Frame {
  /// RGB 图像数据（HWC 排布）
  pub image: RgbImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

impl Frame {
  pub fn new(image: RgbImage, index: u64, timestamp_ms: u64) -> Self {
    Self {
      image,
      index,
      timestamp_ms,
    }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  /// 替换图像，保留序号与时间戳
  pub fn with_image(&self, image: RgbImage) -> Self {
    Self {
      image,
      index: self.index,
      timestamp_ms: self.timestamp_ms,
    }
  }
}

impl From<RgbImage> for Frame {
  fn from(image: RgbImage) -> Self {
    Self::new(image, 0, 0)
  }
}
