// 该文件是 Xueyin （血印） 项目的一部分。
// src/input/read_upload_file.rs - 图像文件上传输入
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

//! # 图像文件上传输入模块
//!
//! 从本地文件构造一次上传，MIME 类型按扩展名推断。准入校验仍由
//! [`load_upload`](crate::input::load_upload) 的策略完成，本模块
//! 只负责搬运字节，不做任何放行决定。
//!
//! ## 基本用法
//!
//! ```no_run
//! use xueyin::{FromUrl, input::UploadFileInput};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let url = Url::parse("image:/data/fingerprints/sample.png")?;
//! let input = UploadFileInput::from_url(&url)?;
//! for upload in input.into_uploads() {
//!   println!("读取上传 {} 字节, MIME {}", upload.bytes.len(), upload.mime);
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::Upload};

#[derive(Error, Debug)]
pub enum UploadFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

const READ_UPLOAD_FILE_SCHEME: &str = "image";

/// 按扩展名推断声明 MIME 类型，未知扩展名交给策略层拒绝
fn mime_for_path(path: &str) -> String {
  let extension = std::path::Path::new(path)
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase());

  match extension.as_deref() {
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("bmp") => "image/bmp",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    _ => "application/octet-stream",
  }
  .to_string()
}

pub struct UploadFileInput {
  upload: Option<Upload>,
}

impl FromUrlWithScheme for UploadFileInput {
  const SCHEME: &'static str = READ_UPLOAD_FILE_SCHEME;
}

impl FromUrl for UploadFileInput {
  type Error = UploadFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(UploadFileInputError::SchemeMismatch);
    }

    let path = url.path();
    let bytes = std::fs::read(path)?;
    let upload = Upload::new(bytes, mime_for_path(path)).with_source(path);

    Ok(UploadFileInput {
      upload: Some(upload),
    })
  }
}

impl UploadFileInput {
  pub fn into_uploads(self) -> UploadFileInputIter {
    UploadFileInputIter { inner: self }
  }
}

pub struct UploadFileInputIter {
  inner: UploadFileInput,
}

impl Iterator for UploadFileInputIter {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.upload.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mime_follows_extension() {
    assert_eq!(mime_for_path("/a/b/scan.png"), "image/png");
    assert_eq!(mime_for_path("/a/b/scan.JPG"), "image/jpeg");
    assert_eq!(mime_for_path("/a/b/scan.jpeg"), "image/jpeg");
    assert_eq!(mime_for_path("/a/b/scan.bmp"), "image/bmp");
    assert_eq!(mime_for_path("/a/b/scan.gif"), "image/gif");
    assert_eq!(mime_for_path("/a/b/scan"), "application/octet-stream");
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("file:/tmp/scan.png").unwrap();
    assert!(matches!(
      UploadFileInput::from_url(&url),
      Err(UploadFileInputError::SchemeMismatch)
    ));
  }

  #[test]
  fn missing_file_surfaces_io_error() {
    let url = Url::parse("image:/no/such/path/scan.png").unwrap();
    assert!(matches!(
      UploadFileInput::from_url(&url),
      Err(UploadFileInputError::IoError(_))
    ));
  }

  #[test]
  fn reads_file_once() {
    let path = std::env::temp_dir().join("xueyin-upload-file-test.png");
    std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

    let url = Url::parse(&format!("image:{}", path.display())).unwrap();
    let input = UploadFileInput::from_url(&url).unwrap();
    let mut uploads = input.into_uploads();

    let upload = uploads.next().unwrap();
    assert_eq!(upload.bytes, vec![1, 2, 3, 4]);
    assert_eq!(upload.mime, "image/png");
    assert!(upload.source.unwrap().ends_with("xueyin-upload-file-test.png"));
    assert!(uploads.next().is_none());

    let _ = std::fs::remove_file(&path);
  }
}
