// 该文件是 Wuti （物体检测） 项目的一部分。
// src/main.rs - 物体检测命令行工具
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

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter};

use wuti::{
  FromUrl, FromUrlWithScheme,
  input::{DetectMode, InputWrapper},
  logging::{self, LogConfig},
  model::{DetectionFileBuilder, InferParams},
  output::{
    OutputWrapper,
    draw::{Draw, load_font},
  },
  task::{ContinuousTask, ImageTask, Overlay, StopFlag, Task, TaskReport},
  url_or_path,
};

/// 物体检测智能识别工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型（检测结果文件）路径
  #[arg(long, value_name = "MODEL")]
  pub model: String,
  /// 运行模式
  #[arg(long, value_enum, default_value_t = DetectMode::Camera)]
  pub mode: DetectMode,
  /// 检测源：图片路径或摄像头 ID
  #[arg(long, value_name = "SOURCE", default_value = "0")]
  pub source: String,
  /// 置信度阈值
  #[arg(long, default_value_t = 0.5)]
  pub conf: f32,
  /// 推理尺寸
  #[arg(long, default_value_t = 320)]
  pub imgsz: u32,
  /// 输出：图片路径、`image://`、`folder://`；缺省时只写日志
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<String>,
  /// 标签字体（TrueType）
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
  /// 摄像头模式下最多处理的帧数
  #[arg(long, value_name = "FRAMES")]
  pub max_frames: Option<u64>,
  #[arg(long, default_value_t = LevelFilter::INFO)]
  pub log_level: LevelFilter,
  /// 日志文件目录
  #[arg(long, value_name = "DIR")]
  pub log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let config = LogConfig {
    level: args.log_level,
    directory: args.log_dir.clone(),
  };
  match logging::init(config) {
    Ok(Some(path)) => info!("日志文件: {}", path.display()),
    Ok(None) => {}
    Err(e) => {
      eprintln!("{e}");
      return ExitCode::FAILURE;
    }
  }

  match run(&args) {
    Ok(report) => {
      println!(
        "共处理 {} 帧，检测到 {} 个目标，平均 FPS {:.1}",
        report.frames, report.detections, report.mean_fps
      );
      ExitCode::SUCCESS
    }
    Err(e) => {
      error!("{:#}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(args: &Args) -> Result<TaskReport> {
  info!("========================================");
  info!("        物体检测智能识别工具        ");
  info!("========================================");
  info!("运行模式: {:?}", args.mode);
  info!("模型路径: {}", args.model);
  info!("检测源: {}", args.source);
  info!("置信度阈值: {}", args.conf);
  info!("推理尺寸: {}", args.imgsz);

  let params = InferParams {
    confidence: args.conf,
    image_size: args.imgsz,
  };
  let model_url = url_or_path(&args.model, DetectionFileBuilder::SCHEME)
    .with_context(|| format!("无效的模型路径: {}", args.model))?;
  let model = DetectionFileBuilder::from_url(&model_url)?
    .params(params)
    .build()
    .with_context(|| format!("无法加载模型: {}", args.model))?;

  let input = InputWrapper::open(args.mode, &args.source)
    .with_context(|| format!("无法打开检测源: {}", args.source))?;

  let output = match &args.output {
    Some(location) => {
      let url = url_or_path(location, "image")
        .with_context(|| format!("无效的输出路径: {}", location))?;
      OutputWrapper::from_url(&url).with_context(|| format!("无法创建输出: {}", location))?
    }
    None => OutputWrapper::default(),
  };

  let draw = match &args.font {
    Some(path) => Draw::new(Some(
      load_font(path).with_context(|| format!("无法加载字体: {}", path.display()))?,
    )),
    None => Draw::default(),
  };
  let overlay = Overlay::new(draw, args.conf);

  match args.mode {
    DetectMode::Image => ImageTask::new(overlay).run_task(input, model, output),
    DetectMode::Camera => {
      let stop = StopFlag::default();
      stop
        .install_ctrlc_handler()
        .context("无法注册 Ctrl-C 处理函数")?;
      info!("按 Ctrl-C 退出");
      ContinuousTask::new(overlay)
        .with_frame_number(args.max_frames)
        .with_stop_flag(stop)
        .run_task(input, model, output)
    }
  }
}
