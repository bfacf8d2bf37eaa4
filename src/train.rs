// 该文件是 Wuti （物体检测） 项目的一部分。
// src/train.rs - 训练/验证/测试命令封装
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
use std::process::{Command, ExitStatus};

use clap::{ArgAction, Args, ValueEnum};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TrainError {
  #[error("数据集配置文件不存在: {0}")]
  DatasetNotFound(PathBuf),
  #[error("测试模式需要 --source")]
  MissingSource,
  #[error("无法启动训练命令 {program}: {source}")]
  Spawn {
    program: String,
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrainMode {
  Train,
  Val,
  Test,
}

impl TrainMode {
  fn command(self) -> &'static str {
    match self {
      TrainMode::Train => "train",
      TrainMode::Val => "val",
      TrainMode::Test => "predict",
    }
  }
}

#[derive(Args, Debug, Clone)]
pub struct TrainConfig {
  /// 模型路径或名称
  #[arg(long, default_value = "yolov8n.pt")]
  pub model: String,
  /// 数据集配置文件
  #[arg(long, default_value = "object.yaml")]
  pub data: PathBuf,
  #[arg(long, default_value_t = 100)]
  pub epochs: u32,
  #[arg(long, default_value_t = 16)]
  pub batch: u32,
  #[arg(long, default_value_t = 640)]
  pub imgsz: u32,
  /// 初始学习率
  #[arg(long, default_value_t = 0.01)]
  pub lr0: f64,
  #[arg(long = "weight-decay", alias = "weight_decay", default_value_t = 0.0005)]
  pub weight_decay: f64,
  /// 数据增强
  #[arg(long, default_value_t = true, action = ArgAction::Set)]
  pub augment: bool,
  #[arg(long, default_value = "0")]
  pub device: String,
  #[arg(long, default_value_t = 8)]
  pub workers: u32,
  #[arg(long, default_value = "object_training")]
  pub project: String,
  /// 实验名称
  #[arg(long, default_value = "exp1")]
  pub name: String,
  #[arg(long, value_enum, default_value_t = TrainMode::Train)]
  pub mode: TrainMode,
  /// 测试模式的预测来源
  #[arg(long)]
  pub source: Option<String>,
  /// 模型库提供的命令行程序
  #[arg(long, default_value = "yolo")]
  pub executable: String,
}

impl TrainConfig {
  pub fn validate(&self) -> Result<(), TrainError> {
    if !self.data.exists() {
      return Err(TrainError::DatasetNotFound(self.data.clone()));
    }
    if self.mode == TrainMode::Test && self.source.as_deref().is_none_or(str::is_empty) {
      return Err(TrainError::MissingSource);
    }
    Ok(())
  }

  /// `detect <模式> key=value ...`，不含程序名
  pub fn command_args(&self) -> Vec<String> {
    let mut args = vec!["detect".to_string(), self.mode.command().to_string()];
    let mut set = |key: &str, value: String| args.push(format!("{key}={value}"));

    set("model", self.model.clone());
    match self.mode {
      TrainMode::Train => {
        set("data", self.data.display().to_string());
        set("epochs", self.epochs.to_string());
        set("batch", self.batch.to_string());
        set("imgsz", self.imgsz.to_string());
        set("lr0", self.lr0.to_string());
        set("weight_decay", self.weight_decay.to_string());
        set("augment", python_bool(self.augment).to_string());
        set("device", self.device.clone());
        set("workers", self.workers.to_string());
        set("project", self.project.clone());
        set("name", self.name.clone());
      }
      TrainMode::Val => {
        set("data", self.data.display().to_string());
        set("imgsz", self.imgsz.to_string());
        set("batch", self.batch.to_string());
        set("device", self.device.clone());
      }
      TrainMode::Test => {
        set("source", self.source.clone().unwrap_or_default());
        set("imgsz", self.imgsz.to_string());
        set("device", self.device.clone());
        set("save", python_bool(true).to_string());
        set("show", python_bool(false).to_string());
        set("conf", "0.5".to_string());
      }
    }
    args
  }

  fn log_plan(&self) {
    info!("模式: {:?}", self.mode);
    info!("模型: {}", self.model);
    match self.mode {
      TrainMode::Test => info!("来源: {}", self.source.as_deref().unwrap_or_default()),
      _ => info!("数据集: {}", self.data.display()),
    }
    if self.mode == TrainMode::Train {
      info!("训练轮数: {}", self.epochs);
      info!("初始学习率: {}", self.lr0);
      info!("权重衰减: {}", self.weight_decay);
      info!("数据增强: {}", self.augment);
      info!("工作线程: {}", self.workers);
      info!("输出: {}/{}", self.project, self.name);
    }
    info!("批大小: {}", self.batch);
    info!("图像尺寸: {}", self.imgsz);
    info!("设备: {}", self.device);
  }

  /// 校验参数后以子进程运行，返回其退出状态
  pub fn run(&self) -> Result<ExitStatus, TrainError> {
    self.validate()?;
    self.log_plan();

    let args = self.command_args();
    info!("执行: {} {}", self.executable, args.join(" "));
    Command::new(&self.executable)
      .args(&args)
      .status()
      .map_err(|source| TrainError::Spawn {
        program: self.executable.clone(),
        source,
      })
  }
}

fn python_bool(value: bool) -> &'static str {
  if value { "True" } else { "False" }
}
