// 该文件是 Wuti （物体检测） 项目的一部分。
// src/fps.rs - 帧率测量
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

use std::{
  collections::VecDeque,
  time::{Duration, Instant},
};

/// 滑动平均窗口的默认长度
pub const FPS_WINDOW_SIZE: usize = 10;

/// 单次测量结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsSample {
  /// 每秒帧数
  pub fps: f64,
  /// 耗时
  pub elapsed: Duration,
}

impl FpsSample {
  pub fn elapsed_secs(&self) -> f64 {
    self.elapsed.as_secs_f64()
  }
}

/// 无状态的帧率计算器
pub struct FpsMeter;

impl FpsMeter {
  /// 计算 `start` 到 `end` 之间的耗时与帧率；耗时为零时帧率为 0
  pub fn measure(start: Instant, end: Instant) -> FpsSample {
    let elapsed = end.saturating_duration_since(start);
    let secs = elapsed.as_secs_f64();
    let fps = if secs > 0.0 { 1.0 / secs } else { 0.0 };
    FpsSample { fps, elapsed }
  }

  pub fn measure_since(start: Instant) -> FpsSample {
    Self::measure(start, Instant::now())
  }
}

/// 由调用方持有的帧率滑动窗口
#[derive(Debug, Clone)]
pub struct FpsWindow {
  samples: VecDeque<f64>,
  capacity: usize,
}

impl Default for FpsWindow {
  fn default() -> Self {
    Self::with_capacity(FPS_WINDOW_SIZE)
  }
}

impl FpsWindow {
  pub fn with_capacity(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      samples: VecDeque::with_capacity(capacity + 1),
      capacity,
    }
  }

  /// 追加一个样本，超出容量时丢弃最旧的样本，返回当前平均值
  pub fn push(&mut self, fps: f64) -> f64 {
    self.samples.push_back(fps);
    while self.samples.len() > self.capacity {
      self.samples.pop_front();
    }
    self.mean()
  }

  /// 当前窗口的算术平均值，空窗口为 0
  pub fn mean(&self) -> f64 {
    if self.samples.is_empty() {
      return 0.0;
    }
    self.samples.iter().sum::<f64>() / self.samples.len() as f64
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}
