// 该文件是 Wuti （物体检测） 项目的一部分。
// src/input/camera_input.rs - V4L 摄像头输入
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
use std::time::Instant;

use image::{ImageFormat, Rgb, RgbImage};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use v4l::{
  Device, FourCC,
  buffer::Type,
  io::{mmap::Stream, traits::CaptureStream},
  video::Capture,
};

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, url_to_path};

/// 请求的采集分辨率，驱动可能调整为最接近的支持值
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

const STREAM_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Invalid device path: {0}")]
  InvalidDevicePath(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Unsupported pixel format: {0}")]
  UnsupportedPixelFormat(String),
}

/// 采集流在设备之前释放，二者随 `CameraInput` 一起关闭
pub struct CameraInput {
  stream: Stream<'static>,
  device: Device,
  fourcc: FourCC,
  width: u32,
  height: u32,
  index: u64,
  started: Instant,
}

impl FromUrlWithScheme for CameraInput {
  const SCHEME: &'static str = "v4l";
}

impl FromUrl for CameraInput {
  type Error = CameraInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(CameraInputError::SchemaMismatch);
    }

    let path = url_to_path(url).map_err(|e| CameraInputError::InvalidDevicePath(e.to_string()))?;
    if path.as_os_str().is_empty() || path == Path::new("/") {
      return Self::open(Self::device_path("0"));
    }
    Self::open(path)
  }
}

impl CameraInput {
  /// 纯数字视为摄像头编号 `N` 即 `/dev/videoN`，其余按设备路径处理
  pub fn device_path(source: &str) -> PathBuf {
    match source.trim().parse::<u32>() {
      Ok(id) => PathBuf::from(format!("/dev/video{id}")),
      Err(_) => PathBuf::from(source),
    }
  }

  pub fn open(path: impl AsRef<Path>) -> Result<Self, CameraInputError> {
    let path = path.as_ref();
    let device = Device::with_path(path)?;

    let mut format = device.format()?;
    format.width = CAPTURE_WIDTH;
    format.height = CAPTURE_HEIGHT;
    format.fourcc = FourCC::new(b"MJPG");
    let mut actual = device.set_format(&format)?;
    if !is_supported(&actual.fourcc) {
      warn!("摄像头不支持 MJPG，尝试 YUYV");
      format.fourcc = FourCC::new(b"YUYV");
      actual = device.set_format(&format)?;
    }
    if !is_supported(&actual.fourcc) {
      return Err(CameraInputError::UnsupportedPixelFormat(
        actual.fourcc.to_string(),
      ));
    }

    let stream = Stream::with_buffers(&device, Type::VideoCapture, STREAM_BUFFERS)?;

    info!(
      "摄像头已打开: {} {}x{} [{}]",
      path.display(),
      actual.width,
      actual.height,
      actual.fourcc
    );

    Ok(Self {
      stream,
      device,
      fourcc: actual.fourcc,
      width: actual.width,
      height: actual.height,
      index: 0,
      started: Instant::now(),
    })
  }

  pub fn device(&self) -> &Device {
    &self.device
  }

  pub fn resolution(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn capture(&mut self) -> Result<RgbImage, CameraInputError> {
    let (data, _meta) = self.stream.next()?;
    match self.fourcc.str() {
      Ok("MJPG") => image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map(|image| image.to_rgb8())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into()),
      Ok("YUYV") => Ok(yuyv_to_rgb(data, self.width, self.height)),
      _ => Err(CameraInputError::UnsupportedPixelFormat(
        self.fourcc.to_string(),
      )),
    }
  }
}

fn is_supported(fourcc: &FourCC) -> bool {
  matches!(fourcc.str(), Ok("MJPG") | Ok("YUYV"))
}

impl Iterator for CameraInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    match self.capture() {
      Ok(image) => {
        let frame = Frame::new(
          image,
          self.index,
          self.started.elapsed().as_millis() as u64,
        );
        self.index += 1;
        Some(frame)
      }
      Err(e) => {
        error!("无法读取摄像头帧: {}", e);
        None
      }
    }
  }
}

/// YUYV 4:2:2，每 4 字节两个像素，BT.601 换算
fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> RgbImage {
  let mut out = RgbImage::new(width, height);
  if width == 0 {
    return out;
  }

  let convert = |y: f32, u: f32, v: f32| {
    Rgb([
      (y + 1.402 * v).clamp(0.0, 255.0) as u8,
      (y - 0.344_136 * u - 0.714_136 * v).clamp(0.0, 255.0) as u8,
      (y + 1.772 * u).clamp(0.0, 255.0) as u8,
    ])
  };

  for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
    let u = chunk[1] as f32 - 128.0;
    let v = chunk[3] as f32 - 128.0;
    let pixel = i as u32 * 2;
    let (x, y) = (pixel % width, pixel / width);
    if y >= height {
      break;
    }
    out.put_pixel(x, y, convert(chunk[0] as f32, u, v));
    if x + 1 < width {
      out.put_pixel(x + 1, y, convert(chunk[2] as f32, u, v));
    }
  }
  out
}
