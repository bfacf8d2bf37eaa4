// 该文件是 Wuti （物体检测） 项目的一部分。
// src/model/detection_file.rs - 检测结果回放模型
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

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::{DetectResult, Detection, InferParams, Model},
  url_to_path,
};

#[derive(Error, Debug)]
pub enum DetectionFileError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型文件格式错误: {0}")]
  ModelFormatError(#[from] serde_json::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

/// JSON 文件内容：单帧列表（每帧重复）或逐帧列表（循环回放）
#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionRecords {
  Single(Vec<Detection>),
  PerFrame(Vec<Vec<Detection>>),
}

pub struct DetectionFileBuilder {
  path: PathBuf,
  params: InferParams,
}

impl FromUrlWithScheme for DetectionFileBuilder {
  const SCHEME: &'static str = "detections";
}

impl FromUrl for DetectionFileBuilder {
  type Error = DetectionFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DetectionFileError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let path = url_to_path(url).map_err(|e| DetectionFileError::ModelPathError(e.to_string()))?;
    Ok(Self::from_path(path))
  }
}

impl DetectionFileBuilder {
  pub fn from_path(path: impl AsRef<Path>) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      params: InferParams::default(),
    }
  }

  pub fn params(mut self, params: InferParams) -> Self {
    self.params = params;
    self
  }

  pub fn build(self) -> Result<DetectionFile, DetectionFileError> {
    info!("加载模型文件: {}", self.path.display());
    let data = std::fs::read(&self.path)?;
    let frames = match serde_json::from_slice(&data)? {
      DetectionRecords::Single(items) => vec![items],
      DetectionRecords::PerFrame(frames) => frames,
    };
    debug!("模型文件包含 {} 帧检测结果", frames.len());
    info!(
      "模型加载完成（置信度阈值: {}, 推理尺寸: {}）",
      self.params.confidence, self.params.image_size
    );

    Ok(DetectionFile {
      frames,
      params: self.params,
    })
  }
}

/// 从文件回放预先计算好的检测结果
#[derive(Debug, Clone)]
pub struct DetectionFile {
  frames: Vec<Vec<Detection>>,
  params: InferParams,
}

impl DetectionFile {
  pub fn params(&self) -> InferParams {
    self.params
  }

  pub fn frame_count(&self) -> usize {
    self.frames.len()
  }
}

impl Model for DetectionFile {
  type Input = Frame;
  type Output = DetectResult;
  type Error = DetectionFileError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    if self.frames.is_empty() {
      return Ok(DetectResult::default());
    }

    let slot = (input.index % self.frames.len() as u64) as usize;
    let result: DetectResult = self.frames[slot]
      .iter()
      .filter(|det| det.confidence >= self.params.confidence)
      .copied()
      .collect();

    debug!(
      "帧 {} ({}x{}, 推理尺寸 {}): 检测到 {} 个物体",
      input.index,
      input.width(),
      input.height(),
      self.params.image_size,
      result.len()
    );
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use image::RgbImage;
  use tempfile::NamedTempFile;

  use super::*;

  fn write_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
  }

  fn frame(index: u64) -> Frame {
    Frame::new(RgbImage::new(8, 8), index, 0)
  }

  #[test]
  fn single_list_is_replayed_every_frame() {
    let file = write_json(
      r#"[{"bbox": [10, 10, 50, 50], "confidence": 0.9, "class_id": 0},
          {"bbox": [0, 0, 5, 5], "confidence": 0.2, "class_id": 1}]"#,
    );
    let model = DetectionFileBuilder::from_path(file.path()).build().unwrap();
    assert_eq!(model.frame_count(), 1);

    for index in 0..3 {
      let result = model.infer(&frame(index)).unwrap();
      assert_eq!(result.len(), 1);
      assert_eq!(result.items[0].class_id, 0);
    }
  }

  #[test]
  fn per_frame_lists_cycle() {
    let file = write_json(
      r#"[[{"bbox": [1, 1, 2, 2], "confidence": 0.9, "class_id": 1}],
          [],
          [{"bbox": [1, 1, 2, 2], "confidence": 0.9, "class_id": 3}]]"#,
    );
    let model = DetectionFileBuilder::from_path(file.path()).build().unwrap();
    assert_eq!(model.frame_count(), 3);

    assert_eq!(model.infer(&frame(0)).unwrap().items[0].class_id, 1);
    assert!(model.infer(&frame(1)).unwrap().is_empty());
    assert_eq!(model.infer(&frame(2)).unwrap().items[0].class_id, 3);
    assert_eq!(model.infer(&frame(3)).unwrap().items[0].class_id, 1);
  }

  #[test]
  fn confidence_prefilter_follows_params() {
    let file = write_json(r#"[{"bbox": [0, 0, 4, 4], "confidence": 0.3, "class_id": 0}]"#);
    let model = DetectionFileBuilder::from_path(file.path())
      .params(InferParams {
        confidence: 0.25,
        image_size: 640,
      })
      .build()
      .unwrap();
    assert_eq!(model.params().image_size, 640);
    assert_eq!(model.infer(&frame(0)).unwrap().len(), 1);
  }

  #[test]
  fn empty_file_yields_no_detections() {
    let file = write_json("[]");
    let model = DetectionFileBuilder::from_path(file.path()).build().unwrap();
    assert!(model.infer(&frame(0)).unwrap().is_empty());
  }

  #[test]
  fn missing_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = DetectionFileBuilder::from_path(dir.path().join("missing.json")).build();
    assert!(matches!(result, Err(DetectionFileError::ModelLoadError(_))));
  }

  #[test]
  fn malformed_file_fails_to_load() {
    let file = write_json(r#"{"not": "a list"}"#);
    let result = DetectionFileBuilder::from_path(file.path()).build();
    assert!(matches!(result, Err(DetectionFileError::ModelFormatError(_))));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("image:///tmp/model.json").unwrap();
    assert!(matches!(
      DetectionFileBuilder::from_url(&url),
      Err(DetectionFileError::ModelPathError(_))
    ));
  }

  #[test]
  fn url_path_is_used() {
    let file = write_json("[]");
    let url = crate::url_or_path(file.path().to_str().unwrap(), DetectionFileBuilder::SCHEME).unwrap();
    let model = DetectionFileBuilder::from_url(&url).unwrap().build().unwrap();
    assert_eq!(model.frame_count(), 1);
  }
}
