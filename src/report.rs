// 该文件是 Xueyin （血印） 项目的一部分。
// src/report.rs - 预测报告装配
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

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::decode::Prediction;
use crate::label::{BLOOD_GROUPS, BloodGroup};

/// 调用方附带的请求元数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
  pub request_id: String,
  pub timestamp_ms: i64,
  pub source: Option<String>,
}

impl ReportMeta {
  /// 以当前时间构造元数据
  pub fn now(request_id: impl Into<String>) -> Self {
    ReportMeta {
      request_id: request_id.into(),
      timestamp_ms: Utc::now().timestamp_millis(),
      source: None,
    }
  }

  pub fn with_source(mut self, source: impl Into<String>) -> Self {
    self.source = Some(source.into());
    self
  }
}

/// 单个标签的得分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScore {
  pub blood_group: BloodGroup,
  pub probability: f32,
}

/// 最终交付给调用方的预测报告。
///
/// 除获胜血型与置信度外，附带完整的逐标签得分以及可供血的
/// 血型列表，便于前端展示与留档回溯。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
  pub request_id: String,
  pub timestamp_ms: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  pub blood_group: BloodGroup,
  pub confidence: f32,
  pub probabilities: Vec<LabelScore>,
  pub compatible_groups: Vec<BloodGroup>,
}

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("缺少请求标识")]
  MissingRequestId,
  #[error("分布长度与标签数不符: 输出 {outputs}, 标签 {labels}")]
  DistributionLength { outputs: usize, labels: usize },
}

/// 把解码结果与请求元数据装配成报告。
///
/// 请求标识为空即拒绝，空白字符同样视为缺失。
pub fn assemble(
  meta: ReportMeta,
  prediction: Prediction,
  distribution: &[f32],
) -> Result<PredictionReport, ReportError> {
  if meta.request_id.trim().is_empty() {
    error!("请求缺少标识, 无法装配报告");
    return Err(ReportError::MissingRequestId);
  }

  if distribution.len() != BLOOD_GROUPS.len() {
    error!(
      "分布长度与标签数不符: 输出 {}, 标签 {}",
      distribution.len(),
      BLOOD_GROUPS.len()
    );
    return Err(ReportError::DistributionLength {
      outputs: distribution.len(),
      labels: BLOOD_GROUPS.len(),
    });
  }

  let probabilities = BLOOD_GROUPS
    .iter()
    .zip(distribution)
    .map(|(&blood_group, &probability)| LabelScore {
      blood_group,
      probability,
    })
    .collect();

  Ok(PredictionReport {
    request_id: meta.request_id,
    timestamp_ms: meta.timestamp_ms,
    source: meta.source,
    blood_group: prediction.blood_group,
    confidence: prediction.confidence,
    probabilities,
    compatible_groups: prediction.blood_group.compatible_donors().to_vec(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_distribution() -> [f32; 8] {
    [0.05, 0.05, 0.6, 0.05, 0.05, 0.05, 0.05, 0.1]
  }

  fn sample_prediction() -> Prediction {
    Prediction {
      blood_group: BloodGroup::BPositive,
      confidence: 0.6,
    }
  }

  #[test]
  fn empty_request_id_is_rejected() {
    let meta = ReportMeta {
      request_id: String::new(),
      timestamp_ms: 0,
      source: None,
    };
    assert!(matches!(
      assemble(meta, sample_prediction(), &sample_distribution()),
      Err(ReportError::MissingRequestId)
    ));

    let blank = ReportMeta {
      request_id: "   ".to_string(),
      timestamp_ms: 0,
      source: None,
    };
    assert!(matches!(
      assemble(blank, sample_prediction(), &sample_distribution()),
      Err(ReportError::MissingRequestId)
    ));
  }

  #[test]
  fn distribution_length_is_checked() {
    let meta = ReportMeta::now("req-1");
    assert!(matches!(
      assemble(meta, sample_prediction(), &[0.5, 0.5]),
      Err(ReportError::DistributionLength {
        outputs: 2,
        labels: 8
      })
    ));
  }

  #[test]
  fn report_carries_all_fields() {
    let meta = ReportMeta {
      request_id: "req-7".to_string(),
      timestamp_ms: 1_700_000_000_000,
      source: Some("upload.png".to_string()),
    };
    let report = assemble(meta, sample_prediction(), &sample_distribution()).unwrap();

    assert_eq!(report.request_id, "req-7");
    assert_eq!(report.timestamp_ms, 1_700_000_000_000);
    assert_eq!(report.source.as_deref(), Some("upload.png"));
    assert_eq!(report.blood_group, BloodGroup::BPositive);
    assert_eq!(report.confidence, 0.6);

    assert_eq!(report.probabilities.len(), 8);
    assert_eq!(report.probabilities[2].blood_group, BloodGroup::BPositive);
    assert_eq!(report.probabilities[2].probability, 0.6);

    assert_eq!(
      report.compatible_groups,
      BloodGroup::BPositive.compatible_donors()
    );
  }

  #[test]
  fn report_serializes_with_label_text() {
    let meta = ReportMeta {
      request_id: "req-9".to_string(),
      timestamp_ms: 42,
      source: None,
    };
    let report = assemble(meta, sample_prediction(), &sample_distribution()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["blood_group"], "B+");
    assert_eq!(json["request_id"], "req-9");
    assert_eq!(json["probabilities"][2]["blood_group"], "B+");
    assert!(json.get("source").is_none());
    assert!(
      json["compatible_groups"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("O-"))
    );
  }

  #[test]
  fn report_round_trips_through_json() {
    let meta = ReportMeta::now("req-11").with_source("stdin");
    let report = assemble(meta, sample_prediction(), &sample_distribution()).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: PredictionReport = serde_json::from_str(&json).unwrap();

    assert_eq!(back.request_id, report.request_id);
    assert_eq!(back.blood_group, report.blood_group);
    assert_eq!(back.probabilities.len(), report.probabilities.len());
  }
}
