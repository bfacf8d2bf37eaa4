// 该文件是 Wuti （物体检测） 项目的一部分。
// src/model.rs - 模型
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

use serde::{Deserialize, Serialize};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 交给模型的推理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferParams {
  /// 置信度阈值
  pub confidence: f32,
  /// 推理尺寸
  pub image_size: u32,
}

impl Default for InferParams {
  fn default() -> Self {
    Self {
      confidence: 0.5,
      image_size: 320,
    }
  }
}

/// 一个检测目标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub bbox: [f32; 4], // [x1, y1, x2, y2]，绝对像素坐标
  pub confidence: f32,
  pub class_id: u32,
}

impl Detection {
  pub fn new(bbox: [f32; 4], confidence: f32, class_id: u32) -> Self {
    Self {
      bbox,
      confidence,
      class_id,
    }
  }

  /// 像素坐标，向零截断而不是四舍五入
  pub fn pixel_box(&self) -> [i32; 4] {
    self.bbox.map(|v| v as i32)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

impl FromIterator<Detection> for DetectResult {
  fn from_iter<T: IntoIterator<Item = Detection>>(iter: T) -> Self {
    iter.into_iter().collect::<Vec<_>>().into()
  }
}

mod detection_file;
pub use self::detection_file::{DetectionFile, DetectionFileBuilder, DetectionFileError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pixel_box_truncates() {
    let det = Detection::new([10.9, 20.5, 49.99, 50.01], 0.9, 0);
    assert_eq!(det.pixel_box(), [10, 20, 49, 50]);
  }

  #[test]
  fn pixel_box_truncates_toward_zero() {
    let det = Detection::new([-0.7, -1.2, 3.0, 4.0], 0.9, 0);
    assert_eq!(det.pixel_box(), [0, -1, 3, 4]);
  }

  #[test]
  fn detection_deserializes_from_json() {
    let det: Detection =
      serde_json::from_str(r#"{"bbox": [1.0, 2.0, 3.0, 4.0], "confidence": 0.75, "class_id": 2}"#)
        .unwrap();
    assert_eq!(det, Detection::new([1.0, 2.0, 3.0, 4.0], 0.75, 2));
  }

  #[test]
  fn result_collects_in_order() {
    let result: DetectResult = (0..3)
      .map(|i| Detection::new([0.0; 4], 0.5, i))
      .collect();
    assert_eq!(result.len(), 3);
    assert_eq!(
      result.iter().map(|d| d.class_id).collect::<Vec<_>>(),
      vec![0, 1, 2]
    );
  }
}
