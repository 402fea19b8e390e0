// 该文件是 Xueyin （血印） 项目的一部分。
// src/input/stdin_upload.rs - 标准输入上传
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

use std::io::Read;

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::Upload};

#[derive(Error, Debug)]
pub enum StdinUploadError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

const STDIN_UPLOAD_SCHEME: &str = "stdin";
const DEFAULT_STDIN_MIME: &str = "image/png";

/// 从标准输入整体读取一次上传，`stdin:?mime=image/jpeg` 形式声明类型。
pub struct StdinUpload {
  upload: Option<Upload>,
}

impl FromUrlWithScheme for StdinUpload {
  const SCHEME: &'static str = STDIN_UPLOAD_SCHEME;
}

impl FromUrl for StdinUpload {
  type Error = StdinUploadError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(StdinUploadError::SchemeMismatch);
    }

    let mime = {
      let mut mime = DEFAULT_STDIN_MIME.to_string();
      for (k, v) in url.query_pairs() {
        if k == "mime" {
          mime = v.into_owned();
          break;
        }
      }
      mime
    };

    let mut bytes = Vec::new();
    std::io::stdin().lock().read_to_end(&mut bytes)?;
    debug!("标准输入读取 {} 字节, 声明 MIME {}", bytes.len(), mime);

    Ok(StdinUpload {
      upload: Some(Upload::new(bytes, mime).with_source("stdin")),
    })
  }
}

impl StdinUpload {
  pub fn into_uploads(self) -> StdinUploadIter {
    StdinUploadIter { inner: self }
  }
}

pub struct StdinUploadIter {
  inner: StdinUpload,
}

impl Iterator for StdinUploadIter {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.upload.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("image:/tmp/scan.png").unwrap();
    assert!(matches!(
      StdinUpload::from_url(&url),
      Err(StdinUploadError::SchemeMismatch)
    ));
  }
}
