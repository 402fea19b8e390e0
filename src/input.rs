// 该文件是 Xueyin （血印） 项目的一部分。
// src/input.rs - 指纹图像上传输入
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

use thiserror::Error;
use tracing::{debug, error};

use crate::FromUrl;

/// 默认允许的上传 MIME 类型
pub const ALLOWED_UPLOAD_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/bmp"];

/// 默认上传大小上限（10 MiB）
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 解码后的原始位图，RGB 三通道，Alpha 通道在解码时丢弃
pub type RawImage = image::RgbImage;

/// 一次上传的原始内容
#[derive(Debug, Clone)]
pub struct Upload {
  /// 文件原始字节
  pub bytes: Vec<u8>,
  /// 调用方声明的 MIME 类型
  pub mime: String,
  /// 来源描述（文件路径等），仅用于日志与报告
  pub source: Option<String>,
}

impl Upload {
  pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
    Upload {
      bytes,
      mime: mime.into(),
      source: None,
    }
  }

  pub fn with_source(mut self, source: impl Into<String>) -> Self {
    self.source = Some(source.into());
    self
  }
}

/// 上传准入策略。
///
/// MIME 白名单与大小上限是策略常量而非协议常量，按部署配置。
#[derive(Debug, Clone)]
pub struct UploadPolicy {
  allowed_types: Vec<String>,
  max_bytes: usize,
}

impl Default for UploadPolicy {
  fn default() -> Self {
    UploadPolicy {
      allowed_types: ALLOWED_UPLOAD_TYPES.iter().map(|s| s.to_string()).collect(),
      max_bytes: MAX_UPLOAD_BYTES,
    }
  }
}

impl UploadPolicy {
  pub fn new(allowed_types: Vec<String>, max_bytes: usize) -> Self {
    UploadPolicy {
      allowed_types,
      max_bytes,
    }
  }

  pub fn max_bytes(&self) -> usize {
    self.max_bytes
  }

  pub fn allows(&self, mime: &str) -> bool {
    self
      .allowed_types
      .iter()
      .any(|allowed| allowed.eq_ignore_ascii_case(mime))
  }
}

#[derive(Error, Debug)]
pub enum UploadError {
  #[error("不支持的图像格式: {0}")]
  UnsupportedFormat(String),
  #[error("文件过大: {actual} 字节, 上限 {limit} 字节")]
  FileTooLarge { actual: usize, limit: usize },
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
}

/// 校验并解码一次上传。
///
/// 校验顺序固定：先 MIME 白名单，再大小上限，最后才触碰解码器，
/// 超限的文件不会产生任何解码开销。解码失败不重试，损坏的图像
/// 重试也不会变好。
pub fn load_upload(upload: Upload, policy: &UploadPolicy) -> Result<RawImage, UploadError> {
  if !policy.allows(&upload.mime) {
    error!("拒绝上传: 不支持的 MIME 类型 '{}'", upload.mime);
    return Err(UploadError::UnsupportedFormat(upload.mime));
  }

  if upload.bytes.len() > policy.max_bytes {
    error!(
      "拒绝上传: 文件 {} 字节超过上限 {} 字节",
      upload.bytes.len(),
      policy.max_bytes
    );
    return Err(UploadError::FileTooLarge {
      actual: upload.bytes.len(),
      limit: policy.max_bytes,
    });
  }

  debug!("解码上传图像: {} 字节", upload.bytes.len());
  let image = image::load_from_memory(&upload.bytes)?.to_rgb8();
  debug!("解码完成: {}x{}", image.width(), image.height());

  Ok(image)
}

#[cfg(feature = "read_upload_file")]
mod read_upload_file;
#[cfg(feature = "read_upload_file")]
pub use self::read_upload_file::{UploadFileInput, UploadFileInputError};

#[cfg(feature = "stdin_upload")]
mod stdin_upload;
#[cfg(feature = "stdin_upload")]
pub use self::stdin_upload::{StdinUpload, StdinUploadError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_upload_file")]
  #[error("图像文件输入错误: {0}")]
  UploadFileInputError(#[from] UploadFileInputError),
  #[cfg(feature = "stdin_upload")]
  #[error("标准输入错误: {0}")]
  StdinUploadError(#[from] StdinUploadError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "read_upload_file")]
  UploadFile(UploadFileInput),
  #[cfg(feature = "stdin_upload")]
  Stdin(StdinUpload),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_upload_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == UploadFileInput::SCHEME {
        let input = UploadFileInput::from_url(url)?;
        return Ok(InputWrapper::UploadFile(input));
      }
    }
    #[cfg(feature = "stdin_upload")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == StdinUpload::SCHEME {
        let input = StdinUpload::from_url(url)?;
        return Ok(InputWrapper::Stdin(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl InputWrapper {
  pub fn into_uploads(self) -> InputWrapperIter {
    match self {
      #[cfg(feature = "read_upload_file")]
      InputWrapper::UploadFile(input) => InputWrapperIter::UploadFile(input.into_uploads()),
      #[cfg(feature = "stdin_upload")]
      InputWrapper::Stdin(input) => InputWrapperIter::Stdin(input.into_uploads()),
    }
  }
}

pub enum InputWrapperIter {
  #[cfg(feature = "read_upload_file")]
  UploadFile(self::read_upload_file::UploadFileInputIter),
  #[cfg(feature = "stdin_upload")]
  Stdin(self::stdin_upload::StdinUploadIter),
}

impl Iterator for InputWrapperIter {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_upload_file")]
      InputWrapperIter::UploadFile(input) => input.next(),
      #[cfg(feature = "stdin_upload")]
      InputWrapperIter::Stdin(input) => input.next(),
    }
  }
}
