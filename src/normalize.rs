// 该文件是 Xueyin （血印） 项目的一部分。
// src/normalize.rs - 位图到张量的归一化
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
use tracing::debug;

use crate::input::RawImage;
use crate::tensor::{InputTensor, TensorShape};

/// 默认模型输入边长。
///
/// 历史部署同时出现过 224 与 128，两者属于配置漂移而非双分辨率设计，
/// 这里只保留一个可配置常量，不猜测“正确”值。
pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Error, Debug)]
pub enum NormalizeError {
  #[error("目标分辨率非正: {height}x{width}")]
  NonPositiveTarget { height: u32, width: u32 },
  #[error("源图像为空: {width}x{height}")]
  EmptySource { width: u32, height: u32 },
}

/// 归一化器：重采样到固定分辨率并把字节缩放到 [0.0, 1.0]。
///
/// 重采样固定使用双线性插值，保证同一输入重复归一化得到逐位相同
/// 的张量；除 255 之外不做任何均值/方差处理。
#[derive(Debug, Clone)]
pub struct Normalizer {
  target: TensorShape,
}

impl Default for Normalizer {
  fn default() -> Self {
    Normalizer {
      target: TensorShape::nhwc(DEFAULT_INPUT_SIZE as usize, DEFAULT_INPUT_SIZE as usize),
    }
  }
}

impl Normalizer {
  pub fn new(height: u32, width: u32) -> Result<Self, NormalizeError> {
    if height == 0 || width == 0 {
      return Err(NormalizeError::NonPositiveTarget { height, width });
    }

    Ok(Normalizer {
      target: TensorShape::nhwc(height as usize, width as usize),
    })
  }

  pub fn target_shape(&self) -> TensorShape {
    self.target
  }

  /// 把位图归一化为 NHWC 输入张量。
  ///
  /// 纯函数：同一位图与同一目标形状必然得到逐位相同的输出，
  /// 没有任何隐藏状态。
  pub fn normalize(&self, image: &RawImage) -> Result<InputTensor, NormalizeError> {
    if image.width() == 0 || image.height() == 0 {
      return Err(NormalizeError::EmptySource {
        width: image.width(),
        height: image.height(),
      });
    }

    let target_width = self.target.width() as u32;
    let target_height = self.target.height() as u32;

    let data = if image.width() == target_width && image.height() == target_height {
      scale_bytes(image.as_raw())
    } else {
      debug!(
        "重采样 {}x{} -> {}x{}",
        image.width(),
        image.height(),
        target_width,
        target_height
      );
      let resized = image::imageops::resize(
        image,
        target_width,
        target_height,
        image::imageops::FilterType::Triangle,
      );
      scale_bytes(resized.as_raw())
    };

    Ok(InputTensor::new(self.target, data))
  }
}

/// 字节值 [0, 255] 除以 255.0 映射到 [0.0, 1.0]
fn scale_bytes(bytes: &[u8]) -> Vec<f32> {
  bytes.iter().map(|&byte| byte as f32 / 255.0).collect()
}
