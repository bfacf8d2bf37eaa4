// 该文件是 Wuti （物体检测） 项目的一部分。
// src/input.rs - 图像/摄像头输入
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

use clap::ValueEnum;
use thiserror::Error;

use crate::{FromUrl, frame::Frame};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "camera_input")]
mod camera_input;
#[cfg(feature = "camera_input")]
pub use self::camera_input::{CameraInput, CameraInputError};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectMode {
  /// 图片检测
  Image,
  /// 摄像头实时检测
  Camera,
}

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "camera_input")]
  #[error("Camera input error: {0}")]
  CameraInputError(#[from] CameraInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("Input kind not enabled in this build: {0:?}")]
  Unsupported(DetectMode),
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "camera_input")]
  Camera(CameraInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "camera_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == CameraInput::SCHEME {
        let input = CameraInput::from_url(url)?;
        return Ok(InputWrapper::Camera(input));
      }
    }
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl InputWrapper {
  /// 按命令行的运行模式打开检测源：图片模式为文件路径，摄像头模式为编号或设备路径
  pub fn open(mode: DetectMode, source: &str) -> Result<Self, InputError> {
    match mode {
      #[cfg(feature = "read_image_file")]
      DetectMode::Image => Ok(InputWrapper::ReadImageFile(ImageFileInput::open(source)?)),
      #[cfg(feature = "camera_input")]
      DetectMode::Camera => Ok(InputWrapper::Camera(CameraInput::open(
        CameraInput::device_path(source),
      )?)),
      #[allow(unreachable_patterns)]
      other => Err(InputError::Unsupported(other)),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.next(),
      #[cfg(feature = "camera_input")]
      InputWrapper::Camera(input) => input.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = url::Url::parse("rtsp://camera.local/stream").unwrap();
    assert!(matches!(
      InputWrapper::from_url(&url),
      Err(InputError::SchemeMismatch)
    ));
  }

  #[cfg(not(feature = "camera_input"))]
  #[test]
  fn camera_mode_requires_feature() {
    assert!(matches!(
      InputWrapper::open(DetectMode::Camera, "0"),
      Err(InputError::Unsupported(DetectMode::Camera))
    ));
  }

  #[cfg(feature = "camera_input")]
  #[test]
  fn camera_mode_opens_numbered_device() {
    assert!(matches!(
      InputWrapper::open(DetectMode::Camera, "4096"),
      Err(InputError::CameraInputError(_))
    ));
  }

  #[cfg(feature = "read_image_file")]
  #[test]
  fn image_mode_reads_one_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.png");
    image::RgbImage::new(5, 3).save(&path).unwrap();

    let mut input = InputWrapper::open(DetectMode::Image, path.to_str().unwrap()).unwrap();
    let frame = input.next().unwrap();
    assert_eq!((frame.width(), frame.height()), (5, 3));
    assert!(input.next().is_none());
  }

  #[cfg(feature = "read_image_file")]
  #[test]
  fn image_mode_with_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");
    assert!(matches!(
      InputWrapper::open(DetectMode::Image, path.to_str().unwrap()),
      Err(InputError::ImageFileInputError(_))
    ));
  }

  #[cfg(feature = "read_image_file")]
  #[test]
  fn image_url_is_dispatched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.png");
    image::RgbImage::new(2, 2).save(&path).unwrap();

    let url = crate::url_or_path(path.to_str().unwrap(), "image").unwrap();
    assert!(matches!(
      InputWrapper::from_url(&url),
      Ok(InputWrapper::ReadImageFile(_))
    ));
  }
}
