// 该文件是 Wuti （物体检测） 项目的一部分。
// src/lib.rs - 库主文件
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

use url::Url;

pub mod category;
pub mod fps;
pub mod frame;
pub mod input;
pub mod logging;
pub mod model;
pub mod output;
pub mod task;
pub mod train;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 将命令行给出的位置解析为 URL。
///
/// 已带方案的字符串（如 `image:///tmp/a.png`）原样解析；
/// 普通文件路径转为绝对路径后挂上 `scheme`。
pub fn url_or_path(location: &str, scheme: &str) -> Result<Url, url::ParseError> {
  if let Ok(url) = Url::parse(location)
    && url.scheme().len() > 1
  {
    return Ok(url);
  }

  let path = std::path::absolute(location).unwrap_or_else(|_| PathBuf::from(location));
  let mut url = Url::parse(&format!("{scheme}://"))?;
  // `?` 与 `#` 由 set_path 转义，`%` 需先转义才能原样解码回来
  url.set_path(&path.to_string_lossy().replace('%', "%25"));
  Ok(url)
}

/// 从 URL 中取回文件路径（解码百分号转义，`scheme://host/path` 中的 host 视作相对路径的首段）。
pub(crate) fn url_to_path(url: &Url) -> Result<PathBuf, std::string::FromUtf8Error> {
  let path = urlencoding::decode(url.path())?;
  match url.host_str() {
    Some(host) if !host.is_empty() => Ok(PathBuf::from(format!("{}{}", host, path))),
    _ => Ok(PathBuf::from(path.into_owned())),
  }
}
