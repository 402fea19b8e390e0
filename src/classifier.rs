// 该文件是 Xueyin （血印） 项目的一部分。
// src/classifier.rs - 分类器边界
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
use crate::tensor::{InputTensor, TensorShape};

/// 血型分类器抽象。
///
/// 推理后端（训练好的模型、远程服务、后备实现）都隐藏在本 trait
/// 之后，管线只关心两件事：后端期望的输入形状，以及一次推理返回
/// 的概率分布。分布长度必须与标签集一致，由解码阶段核对。
pub trait Classifier {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 后端期望的输入张量形状。
  fn input_shape(&self) -> TensorShape;

  /// 对单个输入张量做一次推理，返回各血型的得分分布。
  fn classify(&self, tensor: &InputTensor) -> Result<Vec<f32>, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ClassifyError<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  #[error("张量形状不符: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch {
    expected: TensorShape,
    actual: TensorShape,
  },
  #[error("分类器推理失败: {0}")]
  Backend(#[source] E),
}

/// 核对形状后才把张量交给后端。
///
/// 形状不符说明归一化配置与分类器不匹配，属于配置错误，
/// 绝不能让后端在错误形状上静默推理。
pub fn classify_checked<C: Classifier>(
  classifier: &C,
  tensor: &InputTensor,
) -> Result<Vec<f32>, ClassifyError<C::Error>> {
  let expected = classifier.input_shape();
  let actual = tensor.shape();

  if expected != actual {
    error!("张量形状不符: 期望 {}, 实际 {}", expected, actual);
    return Err(ClassifyError::ShapeMismatch { expected, actual });
  }

  debug!("执行分类推理, 输入形状 {}", actual);
  classifier.classify(tensor).map_err(ClassifyError::Backend)
}

#[cfg(feature = "classifier_fallback")]
mod fallback;

#[cfg(feature = "classifier_fallback")]
pub use self::fallback::{FallbackClassifier, FallbackClassifierError};

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[cfg(feature = "classifier_fallback")]
  #[error("后备分类器错误: {0}")]
  FallbackClassifierError(#[from] FallbackClassifierError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

pub enum ClassifierWrapper {
  #[cfg(feature = "classifier_fallback")]
  Fallback(FallbackClassifier),
}

impl FromUrl for ClassifierWrapper {
  type Error = ClassifierError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "classifier_fallback")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == FallbackClassifier::SCHEME {
        let classifier = FallbackClassifier::from_url(url)?;
        return Ok(ClassifierWrapper::Fallback(classifier));
      }
    }
    error!("不支持的分类器方案: {}", url.scheme());
    Err(ClassifierError::SchemeMismatch)
  }
}

impl Classifier for ClassifierWrapper {
  type Error = ClassifierError;

  fn input_shape(&self) -> TensorShape {
    match self {
      #[cfg(feature = "classifier_fallback")]
      ClassifierWrapper::Fallback(classifier) => classifier.input_shape(),
    }
  }

  fn classify(&self, tensor: &InputTensor) -> Result<Vec<f32>, Self::Error> {
    match self {
      #[cfg(feature = "classifier_fallback")]
      ClassifierWrapper::Fallback(classifier) => match classifier.classify(tensor) {
        Ok(distribution) => Ok(distribution),
        Err(never) => match never {},
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::label::BLOOD_GROUPS;

  struct StubClassifier {
    shape: TensorShape,
    distribution: Vec<f32>,
  }

  impl Classifier for StubClassifier {
    type Error = std::convert::Infallible;

    fn input_shape(&self) -> TensorShape {
      self.shape
    }

    fn classify(&self, _tensor: &InputTensor) -> Result<Vec<f32>, Self::Error> {
      Ok(self.distribution.clone())
    }
  }

  #[derive(Debug, Error)]
  #[error("后端宕机")]
  struct BrokenBackend;

  struct FailingClassifier {
    shape: TensorShape,
  }

  impl Classifier for FailingClassifier {
    type Error = BrokenBackend;

    fn input_shape(&self) -> TensorShape {
      self.shape
    }

    fn classify(&self, _tensor: &InputTensor) -> Result<Vec<f32>, Self::Error> {
      Err(BrokenBackend)
    }
  }

  fn tensor_of(shape: TensorShape) -> InputTensor {
    InputTensor::new(shape, vec![0.5; shape.element_count()])
  }

  #[test]
  fn mismatched_shape_never_reaches_backend() {
    let classifier = StubClassifier {
      shape: TensorShape::nhwc(224, 224),
      distribution: vec![0.125; BLOOD_GROUPS.len()],
    };
    let tensor = tensor_of(TensorShape::nhwc(128, 128));

    match classify_checked(&classifier, &tensor) {
      Err(ClassifyError::ShapeMismatch { expected, actual }) => {
        assert_eq!(expected, TensorShape::nhwc(224, 224));
        assert_eq!(actual, TensorShape::nhwc(128, 128));
      }
      other => panic!("预期形状不符错误, 实际: {:?}", other),
    }
  }

  #[test]
  fn matching_shape_passes_distribution_through() {
    let distribution = vec![0.0, 0.1, 0.2, 0.3, 0.1, 0.1, 0.1, 0.1];
    let classifier = StubClassifier {
      shape: TensorShape::nhwc(32, 32),
      distribution: distribution.clone(),
    };
    let tensor = tensor_of(TensorShape::nhwc(32, 32));

    let result = classify_checked(&classifier, &tensor).unwrap();
    assert_eq!(result, distribution);
  }

  #[test]
  fn backend_failure_is_wrapped() {
    let classifier = FailingClassifier {
      shape: TensorShape::nhwc(16, 16),
    };
    let tensor = tensor_of(TensorShape::nhwc(16, 16));

    assert!(matches!(
      classify_checked(&classifier, &tensor),
      Err(ClassifyError::Backend(BrokenBackend))
    ));
  }

  #[cfg(feature = "classifier_fallback")]
  #[test]
  fn wrapper_rejects_unknown_scheme() {
    let url = url::Url::parse("onnx:/models/blood.onnx").unwrap();
    assert!(matches!(
      ClassifierWrapper::from_url(&url),
      Err(ClassifierError::SchemeMismatch)
    ));
  }

  #[cfg(feature = "classifier_fallback")]
  #[test]
  fn wrapper_builds_fallback_from_url() {
    let url = url::Url::parse("fallback:?seed=7").unwrap();
    let classifier = ClassifierWrapper::from_url(&url).unwrap();
    assert_eq!(classifier.input_shape(), TensorShape::nhwc(224, 224));
  }
}
