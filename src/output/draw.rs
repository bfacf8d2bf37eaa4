// 该文件是 Wuti （物体检测） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{category::CategoryTable, model::Detection};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const FPS_FONT_SIZE: f32 = 32.0;
const LABEL_OFFSET: i32 = 10; // 标签基线位于框上方 10 像素
const FPS_ORIGIN: (i32, i32) = (10, 30);
const BOX_THICKNESS: i32 = 2;
const STROKE_WEIGHT: i32 = 2;
const ACCENT_COLOR: [u8; 3] = [0, 255, 0]; // 绿色

// 常见的系统字体位置
const SYSTEM_FONT_PATHS: &[&str] = &[
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
  "/usr/share/fonts/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
  "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
  "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
  "/usr/share/fonts/noto/NotoSans-Regular.ttf",
  "/System/Library/Fonts/Supplemental/Arial.ttf",
  "/Library/Fonts/Arial.ttf",
  "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Error, Debug)]
pub enum FontError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效的字体文件: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, FontError> {
  let data = std::fs::read(path.as_ref())?;
  Ok(FontArc::try_from_vec(data)?)
}

/// 依次尝试常见的系统字体
pub fn discover_font() -> Option<FontArc> {
  SYSTEM_FONT_PATHS.iter().find_map(|path| match load_font(path) {
    Ok(font) => {
      debug!("使用系统字体: {}", path);
      Some(font)
    }
    Err(_) => None,
  })
}

/// 检测框与标签的绘制器
pub struct Draw {
  font: Option<FontArc>,
  label_scale: PxScale,
  fps_scale: PxScale,
  color: Rgb<u8>,
}

impl Default for Draw {
  fn default() -> Self {
    Self::new(discover_font())
  }
}

impl Draw {
  pub fn new(font: Option<FontArc>) -> Self {
    if font.is_none() {
      warn!("未找到可用字体，仅绘制检测框，不绘制标签文字");
    }

    Self {
      font,
      label_scale: PxScale::from(LABEL_FONT_SIZE),
      fps_scale: PxScale::from(FPS_FONT_SIZE),
      color: Rgb(ACCENT_COLOR),
    }
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = Rgb(color);
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 标签文字及其锚点（文字左下角）；不满足阈值或类别未知时返回 `None`
  pub fn label_for(
    detection: &Detection,
    categories: &CategoryTable,
    conf_threshold: f32,
  ) -> Option<(String, (i32, i32))> {
    if detection.confidence < conf_threshold {
      return None;
    }
    let name = categories.lookup(detection.class_id)?;
    let [x1, y1, _, _] = detection.pixel_box();
    let label = format!("{}: {:.2}", name, detection.confidence);
    Some((label, (x1, y1.saturating_sub(LABEL_OFFSET))))
  }

  /// 在输入图像的副本上绘制检测结果，输入图像保持不变
  pub fn render(
    &self,
    image: &RgbImage,
    detections: &[Detection],
    categories: &CategoryTable,
    conf_threshold: f32,
  ) -> RgbImage {
    let mut annotated = image.clone();
    for detection in detections {
      let Some((label, anchor)) = Self::label_for(detection, categories, conf_threshold) else {
        continue;
      };
      let [x1, y1, x2, y2] = detection.pixel_box();
      self.draw_box(&mut annotated, (x1, y1), (x2, y2));
      self.draw_text(&mut annotated, &label, anchor, self.label_scale);
    }
    annotated
  }

  /// 在左上角绘制帧率
  pub fn draw_fps(&self, image: &mut RgbImage, fps: f64) {
    let text = format!("FPS: {:.1}", fps);
    self.draw_text(image, &text, FPS_ORIGIN, self.fps_scale);
  }

  // 两个角点包含在边框内，边框向内加粗
  fn draw_box(&self, image: &mut RgbImage, (x1, y1): (i32, i32), (x2, y2): (i32, i32)) {
    let (left, right) = (x1.min(x2), x1.max(x2));
    let (top, bottom) = (y1.min(y2), y1.max(y2));

    // 图像外留出边框宽度的余量，可见像素不变
    let (max_x, max_y) = (image.width() as i32, image.height() as i32);
    let clamp_x = |v: i32| v.clamp(-BOX_THICKNESS, max_x + BOX_THICKNESS - 1);
    let clamp_y = |v: i32| v.clamp(-BOX_THICKNESS, max_y + BOX_THICKNESS - 1);
    let (left, right) = (clamp_x(left), clamp_x(right));
    let (top, bottom) = (clamp_y(top), clamp_y(bottom));

    for t in 0..BOX_THICKNESS {
      let width = right - left + 1 - 2 * t;
      let height = bottom - top + 1 - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(left + t, top + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, self.color);
    }
  }

  // anchor 为文字左下角，超出图像的部分直接裁掉
  fn draw_text(&self, image: &mut RgbImage, text: &str, (x, y): (i32, i32), scale: PxScale) {
    let Some(font) = &self.font else {
      return;
    };
    let (_, height) = text_size(scale, font, text);
    let top = y.saturating_sub(height as i32);
    // 横向错位重绘代替笔画粗细
    for dx in 0..STROKE_WEIGHT {
      draw_text_mut(image, self.color, x.saturating_add(dx), top, scale, font, text);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const GREEN: Rgb<u8> = Rgb(ACCENT_COLOR);
  const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

  fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width, height)
  }

  fn plain() -> Draw {
    Draw::new(None)
  }

  #[test]
  fn box_outline_is_two_pixels_wide() {
    let image = blank(100, 100);
    let det = Detection::new([10.0, 10.0, 50.0, 50.0], 0.9, 0);
    let out = plain().render(&image, &[det], CategoryTable::coco(), 0.5);

    for (x, y) in [(10, 10), (50, 50), (10, 50), (50, 10), (30, 10), (10, 30), (50, 30), (30, 50)] {
      assert_eq!(*out.get_pixel(x, y), GREEN, "outer edge at ({x}, {y})");
    }
    for (x, y) in [(11, 30), (49, 30), (30, 11), (30, 49)] {
      assert_eq!(*out.get_pixel(x, y), GREEN, "inner edge at ({x}, {y})");
    }
    for (x, y) in [(12, 30), (30, 30), (9, 30), (51, 30), (30, 9), (30, 51)] {
      assert_eq!(*out.get_pixel(x, y), BLACK, "untouched at ({x}, {y})");
    }
  }

  #[test]
  fn coordinates_are_truncated() {
    let image = blank(60, 60);
    let det = Detection::new([10.9, 10.9, 40.9, 40.9], 0.9, 0);
    let out = plain().render(&image, &[det], CategoryTable::coco(), 0.5);
    assert_eq!(*out.get_pixel(10, 20), GREEN);
    assert_eq!(*out.get_pixel(40, 20), GREEN);
    assert_eq!(*out.get_pixel(42, 20), BLACK);
  }

  #[test]
  fn input_image_is_not_modified() {
    let image = blank(40, 40);
    let det = Detection::new([5.0, 5.0, 30.0, 30.0], 0.9, 0);
    let out = plain().render(&image, &[det], CategoryTable::coco(), 0.5);
    assert_ne!(out, image);
    assert!(image.pixels().all(|p| *p == BLACK));
  }

  #[test]
  fn empty_detections_return_a_distinct_copy() {
    let image = RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]));
    let out = plain().render(&image, &[], CategoryTable::coco(), 0.5);
    assert_eq!(out, image);
    assert_ne!(out.as_raw().as_ptr(), image.as_raw().as_ptr());
  }

  #[test]
  fn threshold_is_inclusive() {
    let image = blank(40, 40);
    let det = Detection::new([5.0, 5.0, 30.0, 30.0], 0.5, 0);
    let out = plain().render(&image, &[det], CategoryTable::coco(), 0.5);
    assert_eq!(*out.get_pixel(5, 5), GREEN);
  }

  #[test]
  fn inverted_box_is_normalized() {
    let image = blank(40, 40);
    let det = Detection::new([30.0, 30.0, 5.0, 5.0], 0.9, 0);
    let out = plain().render(&image, &[det], CategoryTable::coco(), 0.5);
    assert_eq!(*out.get_pixel(5, 5), GREEN);
    assert_eq!(*out.get_pixel(30, 30), GREEN);
  }

  #[test]
  fn degenerate_and_offscreen_boxes_do_not_panic() {
    let image = blank(20, 20);
    let dets = [
      Detection::new([5.0, 5.0, 5.0, 5.0], 0.9, 0),
      Detection::new([-30.0, -30.0, 100.0, 100.0], 0.9, 0),
      Detection::new([500.0, 500.0, 600.0, 600.0], 0.9, 0),
    ];
    let out = plain().render(&image, &dets, CategoryTable::coco(), 0.5);
    assert_eq!(out.dimensions(), (20, 20));
  }

  #[test]
  fn extreme_coordinates_are_clipped() {
    let image = blank(20, 20);
    let huge = Detection::new([-3.0e9, 5.0, 3.0e9, 12.0], 0.9, 0);
    let out = plain().render(&image, &[huge], CategoryTable::coco(), 0.5);
    assert_eq!(*out.get_pixel(0, 5), GREEN);
    assert_eq!(*out.get_pixel(19, 6), GREEN);
    assert_eq!(*out.get_pixel(10, 8), BLACK);

    let label = Draw::label_for(
      &Detection::new([0.0, -3.0e9, 1.0, 1.0], 0.9, 0),
      CategoryTable::coco(),
      0.5,
    );
    assert_eq!(label.map(|(_, anchor)| anchor), Some((0, i32::MIN)));
  }

  #[test]
  fn clipping_keeps_visible_pixels() {
    let image = blank(20, 20);
    let wide = Detection::new([-30.0, 3.0, 100.0, 15.0], 0.9, 0);
    let out = plain().render(&image, &[wide], CategoryTable::coco(), 0.5);
    for x in 0..20 {
      assert_eq!(*out.get_pixel(x, 3), GREEN);
      assert_eq!(*out.get_pixel(x, 4), GREEN);
      assert_eq!(*out.get_pixel(x, 14), GREEN);
      assert_eq!(*out.get_pixel(x, 15), GREEN);
      assert_eq!(*out.get_pixel(x, 9), BLACK);
    }
  }

  #[test]
  fn custom_color_is_used() {
    let image = blank(20, 20);
    let det = Detection::new([2.0, 2.0, 10.0, 10.0], 0.9, 0);
    let out = plain()
      .with_color([255, 0, 0])
      .render(&image, &[det], CategoryTable::coco(), 0.5);
    assert_eq!(*out.get_pixel(2, 2), Rgb([255, 0, 0]));
  }

  #[test]
  fn label_text_and_anchor() {
    let det = Detection::new([10.0, 10.0, 50.0, 50.0], 0.9, 0);
    let (label, anchor) = Draw::label_for(&det, CategoryTable::coco(), 0.5).unwrap();
    assert_eq!(label, "person: 0.90");
    assert_eq!(anchor, (10, 0));
  }

  #[test]
  fn label_anchor_may_leave_the_image() {
    let det = Detection::new([3.0, 4.0, 20.0, 20.0], 0.456, 2);
    let (label, anchor) = Draw::label_for(&det, CategoryTable::coco(), 0.1).unwrap();
    assert_eq!(label, "car: 0.46");
    assert_eq!(anchor, (3, -6));
  }

  #[test]
  fn label_skips_filtered_detections() {
    let low = Detection::new([0.0; 4], 0.3, 0);
    let unknown = Detection::new([0.0; 4], 0.99, 999);
    assert!(Draw::label_for(&low, CategoryTable::coco(), 0.5).is_none());
    assert!(Draw::label_for(&unknown, CategoryTable::coco(), 0.5).is_none());
  }

  #[test]
  fn fps_without_font_is_a_no_op() {
    let mut image = blank(50, 50);
    plain().draw_fps(&mut image, 29.97);
    assert!(image.pixels().all(|p| *p == BLACK));
  }

  #[test]
  fn missing_font_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      load_font(dir.path().join("nope.ttf")),
      Err(FontError::IoError(_))
    ));
  }

  #[test]
  fn garbage_font_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ttf");
    std::fs::write(&path, b"definitely not a font").unwrap();
    assert!(matches!(load_font(&path), Err(FontError::InvalidFont(_))));
  }

  #[test]
  fn labels_are_drawn_when_a_font_is_available() {
    let Some(font) = discover_font() else {
      return;
    };
    let draw = Draw::new(Some(font));
    let image = blank(200, 100);
    let det = Detection::new([10.0, 60.0, 150.0, 90.0], 0.9, 0);
    let out = draw.render(&image, &[det], CategoryTable::coco(), 0.5);
    // 标签位于框上方
    let label_pixels = (0..200)
      .flat_map(|x| (0..50).map(move |y| (x, y)))
      .filter(|&(x, y)| *out.get_pixel(x, y) != BLACK)
      .count();
    assert!(label_pixels > 0);
  }
}
