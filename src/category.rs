// 该文件是 Wuti （物体检测） 项目的一部分。
// src/category.rs - 类别表
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

use std::{borrow::Cow, collections::BTreeMap, sync::LazyLock};

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

static COCO: LazyLock<CategoryTable> =
  LazyLock::new(|| CategoryTable::from_labels(COCO_CLASSES));

/// 类别编号到类别名称的只读映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
  labels: BTreeMap<u32, Cow<'static, str>>,
}

impl CategoryTable {
  /// 进程内共享的 COCO 80 类表，首次访问时构建
  pub fn coco() -> &'static CategoryTable {
    &COCO
  }

  /// 按顺序从 0 开始编号
  pub fn from_labels<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<Cow<'static, str>>,
  {
    labels
      .into_iter()
      .enumerate()
      .map(|(id, label)| (id as u32, label))
      .collect()
  }

  /// 查找类别名称，未知类别返回 `None`
  pub fn lookup(&self, class_id: u32) -> Option<&str> {
    self.labels.get(&class_id).map(|label| label.as_ref())
  }

  pub fn contains(&self, class_id: u32) -> bool {
    self.labels.contains_key(&class_id)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
    self.labels.iter().map(|(id, label)| (*id, label.as_ref()))
  }
}

impl<S: Into<Cow<'static, str>>> FromIterator<(u32, S)> for CategoryTable {
  fn from_iter<T: IntoIterator<Item = (u32, S)>>(iter: T) -> Self {
    Self {
      labels: iter
        .into_iter()
        .map(|(id, label)| (id, label.into()))
        .collect(),
    }
  }
}
