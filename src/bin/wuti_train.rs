// 该文件是 Wuti （物体检测） 项目的一部分。
// src/bin/wuti_train.rs - 训练/验证/测试入口
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

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter};

use wuti::{
  logging::{self, LogConfig},
  train::TrainConfig,
};

/// 物体检测模型训练
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  #[command(flatten)]
  config: TrainConfig,
  #[arg(long, default_value_t = LevelFilter::INFO)]
  log_level: LevelFilter,
  /// 日志文件目录
  #[arg(long, value_name = "DIR")]
  log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Err(e) = logging::init(LogConfig {
    level: args.log_level,
    directory: args.log_dir,
  }) {
    eprintln!("{e}");
    return ExitCode::FAILURE;
  }

  match args.config.run() {
    Ok(status) if status.success() => {
      info!("{:?} 完成", args.config.mode);
      ExitCode::SUCCESS
    }
    Ok(status) => {
      error!("训练命令退出: {}", status);
      status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
    }
    Err(e) => {
      error!("{}", e);
      ExitCode::FAILURE
    }
  }
}
