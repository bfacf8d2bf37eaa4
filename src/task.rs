// 该文件是 Wuti （物体检测） 项目的一部分。
// src/task.rs - 检测任务
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

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use std::{thread, time::Duration, time::Instant};

use tracing::{debug, info, warn};

use crate::{
  category::CategoryTable,
  fps::{FpsMeter, FpsWindow},
  frame::Frame,
  model::{DetectResult, Model},
  output::{Render, draw::Draw},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<TaskReport, Self::Error>;
}

/// 任务结束时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskReport {
  pub frames: u64,
  pub detections: usize,
  pub mean_fps: f64,
}

/// 绘制检测框、标签和帧率
pub struct Overlay {
  draw: Draw,
  categories: &'static CategoryTable,
  confidence: f32,
}

impl Overlay {
  pub fn new(draw: Draw, confidence: f32) -> Self {
    Self {
      draw,
      categories: CategoryTable::coco(),
      confidence,
    }
  }

  pub fn categories(mut self, categories: &'static CategoryTable) -> Self {
    self.categories = categories;
    self
  }

  pub fn annotate(&self, frame: &Frame, result: &DetectResult, fps: f64) -> Frame {
    let mut image = self
      .draw
      .render(&frame.image, &result.items, self.categories, self.confidence);
    self.draw.draw_fps(&mut image, fps);
    frame.with_image(image)
  }
}

/// 共享的停止标志，每帧开始前检查一次
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
  pub fn stop(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_stopped(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Ctrl-C 时置位；30 秒内仍未退出则强制结束进程
  pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
    let flag = self.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      flag.stop();
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
  }
}

/// 图片检测：只处理第一帧
pub struct ImageTask {
  overlay: Overlay,
}

impl ImageTask {
  pub fn new(overlay: Overlay) -> Self {
    Self { overlay }
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Model<Input = Frame, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectResult, Error = RE>,
> Task<I, M, O> for ImageTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;

    let start = Instant::now();
    let result = model.infer(&frame)?;
    let sample = FpsMeter::measure_since(start);

    let annotated = self.overlay.annotate(&frame, &result, sample.fps);
    info!("检测完成");
    info!("推理时间: {:.3}秒", sample.elapsed_secs());
    info!("FPS: {:.1}", sample.fps);
    info!("检测到 {} 个目标", result.len());

    output.render_result(&annotated, &result)?;

    Ok(TaskReport {
      frames: 1,
      detections: result.len(),
      mean_fps: sample.fps,
    })
  }
}

/// 摄像头实时检测，画面上显示最近若干帧的平均帧率
pub struct ContinuousTask {
  overlay: Overlay,
  window: FpsWindow,
  frame_number: Option<u64>,
  stop: StopFlag,
}

impl ContinuousTask {
  pub fn new(overlay: Overlay) -> Self {
    Self {
      overlay,
      window: FpsWindow::default(),
      frame_number: None,
      stop: StopFlag::default(),
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<u64>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
    self.stop = stop;
    self
  }

  pub fn with_window(mut self, window: FpsWindow) -> Self {
    self.window = window;
    self
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Model<Input = Frame, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectResult, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(mut self, mut input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    info!("开始实时检测...");
    let mut report = TaskReport::default();

    loop {
      if self.stop.is_stopped() {
        warn!("收到停止信号，退出任务循环");
        break;
      }
      let Some(frame) = input.next() else {
        break;
      };

      let start = Instant::now();
      let result = model.infer(&frame)?;
      let sample = FpsMeter::measure_since(start);
      let mean_fps = self.window.push(sample.fps);

      let annotated = self.overlay.annotate(&frame, &result, mean_fps);
      output.render_result(&annotated, &result)?;

      report.frames += 1;
      report.detections += result.len();
      report.mean_fps = mean_fps;
      debug!(
        "第 {} 帧: {} 个目标, 推理 {:.3}秒, 平均 FPS {:.1}",
        frame.index,
        result.len(),
        sample.elapsed_secs(),
        mean_fps
      );

      if self.frame_number.is_some_and(|n| report.frames >= n) {
        info!("达到指定帧数 {}, 退出任务循环", report.frames);
        break;
      }
    }

    info!("摄像头检测已退出");
    Ok(report)
  }
}
