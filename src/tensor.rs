// 该文件是 Xueyin （血印） 项目的一部分。
// src/tensor.rs - NHWC 输入张量定义
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

pub const RGB_CHANNELS: usize = 3;
pub const BATCH_SIZE: usize = 1;

/// NHWC 张量形状，批次固定为 1，通道固定为 RGB 三通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
  batch: usize,
  height: usize,
  width: usize,
  channels: usize,
}

impl TensorShape {
  pub fn nhwc(height: usize, width: usize) -> Self {
    TensorShape {
      batch: BATCH_SIZE,
      height,
      width,
      channels: RGB_CHANNELS,
    }
  }

  pub fn batch(&self) -> usize {
    self.batch
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  /// 张量元素总数
  pub fn element_count(&self) -> usize {
    self.batch * self.height * self.width * self.channels
  }
}

impl std::fmt::Display for TensorShape {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "[{}, {}, {}, {}]",
      self.batch, self.height, self.width, self.channels
    )
  }
}

/// 归一化后的模型输入张量。
///
/// 数据按 NHWC 行主序排列，取值范围 [0.0, 1.0]。张量由流水线独占持有，
/// 分类器只读借用，调用返回后立即释放，避免大块浮点缓冲在进程内堆积。
#[derive(Debug, Clone)]
pub struct InputTensor {
  shape: TensorShape,
  data: Box<[f32]>,
}

impl InputTensor {
  /// 由形状和数据构造张量，长度不一致视为内部逻辑错误
  pub fn new(shape: TensorShape, data: Vec<f32>) -> Self {
    if data.len() != shape.element_count() {
      panic!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        shape.element_count(),
        data.len()
      );
    }

    InputTensor {
      shape,
      data: data.into_boxed_slice(),
    }
  }

  pub fn shape(&self) -> TensorShape {
    self.shape
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// 按 (行, 列, 通道) 取值，批次恒为 0
  pub fn value(&self, h: usize, w: usize, c: usize) -> f32 {
    let index = h * self.shape.width * self.shape.channels + w * self.shape.channels + c;
    self.data[index]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shape_reports_nhwc_layout() {
    let shape = TensorShape::nhwc(224, 224);
    assert_eq!(shape.batch(), 1);
    assert_eq!(shape.height(), 224);
    assert_eq!(shape.width(), 224);
    assert_eq!(shape.channels(), 3);
    assert_eq!(shape.element_count(), 224 * 224 * 3);
    assert_eq!(shape.to_string(), "[1, 224, 224, 3]");
  }

  #[test]
  fn tensor_indexes_row_major() {
    let shape = TensorShape::nhwc(2, 2);
    let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let tensor = InputTensor::new(shape, data);
    assert_eq!(tensor.value(0, 0, 0), 0.0);
    assert_eq!(tensor.value(0, 1, 2), 5.0);
    assert_eq!(tensor.value(1, 0, 1), 7.0);
    assert_eq!(tensor.value(1, 1, 2), 11.0);
  }

  #[test]
  #[should_panic(expected = "数据长度不匹配")]
  fn tensor_rejects_wrong_buffer_length() {
    let shape = TensorShape::nhwc(2, 2);
    let _ = InputTensor::new(shape, vec![0.0; 5]);
  }
}
