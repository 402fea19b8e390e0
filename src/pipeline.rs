// 该文件是 Xueyin （血印） 项目的一部分。
// src/pipeline.rs - 预测流水线
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
use tracing::{debug, info};

use crate::classifier::{Classifier, ClassifyError, classify_checked};
use crate::decode::{LabelDecodeError, decode_blood_group};
use crate::input::{Upload, UploadError, UploadPolicy, load_upload};
use crate::normalize::{NormalizeError, Normalizer};
use crate::report::{PredictionReport, ReportError, ReportMeta, assemble};

#[derive(Error, Debug)]
pub enum PredictError<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  #[error("上传校验失败: {0}")]
  Upload(#[from] UploadError),
  #[error("归一化失败: {0}")]
  Normalize(#[from] NormalizeError),
  #[error("分类失败: {0}")]
  Classify(#[from] ClassifyError<E>),
  #[error("解码失败: {0}")]
  Decode(#[from] LabelDecodeError),
  #[error("报告装配失败: {0}")]
  Report(#[from] ReportError),
}

/// 错误归类，决定调用方把责任算在谁头上。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictErrorKind {
  /// 调用方提交的内容有问题
  InvalidInput,
  /// 流水线各环节的配置互不匹配
  Configuration,
  /// 推理后端自身故障
  External,
}

impl<E> PredictError<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn kind(&self) -> PredictErrorKind {
    match self {
      PredictError::Upload(_) => PredictErrorKind::InvalidInput,
      PredictError::Normalize(NormalizeError::EmptySource { .. }) => PredictErrorKind::InvalidInput,
      PredictError::Normalize(NormalizeError::NonPositiveTarget { .. }) => {
        PredictErrorKind::Configuration
      }
      PredictError::Classify(ClassifyError::ShapeMismatch { .. }) => {
        PredictErrorKind::Configuration
      }
      PredictError::Classify(ClassifyError::Backend(_)) => PredictErrorKind::External,
      PredictError::Decode(_) => PredictErrorKind::Configuration,
      PredictError::Report(ReportError::MissingRequestId) => PredictErrorKind::InvalidInput,
      PredictError::Report(ReportError::DistributionLength { .. }) => {
        PredictErrorKind::Configuration
      }
    }
  }
}

/// 血型预测流水线：上传校验 → 归一化 → 分类 → 解码 → 装配。
///
/// 各阶段无共享可变状态，同一实例可在多次调用间复用；
/// 位图与张量用完即释放，不滞留整个调用周期。
pub struct Pipeline<C: Classifier> {
  policy: UploadPolicy,
  normalizer: Normalizer,
  classifier: C,
}

impl<C: Classifier> Pipeline<C> {
  /// 按分类器声明的输入形状构造流水线。
  pub fn new(classifier: C) -> Result<Self, NormalizeError> {
    let shape = classifier.input_shape();
    let normalizer = Normalizer::new(shape.height() as u32, shape.width() as u32)?;

    Ok(Pipeline {
      policy: UploadPolicy::default(),
      normalizer,
      classifier,
    })
  }

  /// 显式给定各环节配置。归一化目标与分类器形状不一致时，
  /// 错误推迟到分类阶段暴露。
  pub fn with_parts(policy: UploadPolicy, normalizer: Normalizer, classifier: C) -> Self {
    Pipeline {
      policy,
      normalizer,
      classifier,
    }
  }

  pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// 处理一次上传，产出预测报告。
  pub fn run(
    &self,
    upload: Upload,
    meta: ReportMeta,
  ) -> Result<PredictionReport, PredictError<C::Error>> {
    debug!(
      "收到上传: {} 字节, 声明类型 {}",
      upload.bytes.len(),
      upload.mime
    );

    let image = load_upload(upload, &self.policy)?;
    let tensor = self.normalizer.normalize(&image)?;
    // 位图在此之后不再使用, 立即释放
    drop(image);

    let distribution = classify_checked(&self.classifier, &tensor)?;
    // 张量同理
    drop(tensor);

    let prediction = decode_blood_group(&distribution)?;
    let report = assemble(meta, prediction, &distribution)?;

    info!(
      "预测完成: {} (置信度 {:.4})",
      report.blood_group, report.confidence
    );
    Ok(report)
  }
}
