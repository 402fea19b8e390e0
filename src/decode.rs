// 该文件是 Xueyin （血印） 项目的一部分。
// src/decode.rs - 输出解码
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

use crate::label::{BLOOD_GROUPS, BloodGroup};

/// 解码后的单次预测：获胜标签及其原始得分。
///
/// 得分原样透传，不做重归一化或截断；后端给出越界分布时
/// 如实暴露给调用方。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
  pub blood_group: BloodGroup,
  pub confidence: f32,
}

#[derive(Error, Debug)]
pub enum LabelDecodeError {
  #[error("输出长度与标签数不符: 输出 {outputs}, 标签 {labels}")]
  LabelCountMismatch { outputs: usize, labels: usize },
  #[error("输出分布为空")]
  EmptyDistribution,
}

/// 按 argmax 解码输出分布。
///
/// 长度核对先于一切取值；并列最大值取先出现的下标。
pub fn decode_label(
  distribution: &[f32],
  labels: &[BloodGroup],
) -> Result<Prediction, LabelDecodeError> {
  if distribution.len() != labels.len() {
    error!(
      "输出长度与标签数不符: 输出 {}, 标签 {}",
      distribution.len(),
      labels.len()
    );
    return Err(LabelDecodeError::LabelCountMismatch {
      outputs: distribution.len(),
      labels: labels.len(),
    });
  }

  if distribution.is_empty() {
    return Err(LabelDecodeError::EmptyDistribution);
  }

  let mut best_index = 0;
  let mut best_score = distribution[0];
  for (index, &score) in distribution.iter().enumerate().skip(1) {
    if score > best_score {
      best_score = score;
      best_index = index;
    }
  }

  debug!("解码结果: {} (得分 {:.4})", labels[best_index], best_score);
  Ok(Prediction {
    blood_group: labels[best_index],
    confidence: best_score,
  })
}

/// 以内置血型标签集解码。
pub fn decode_blood_group(distribution: &[f32]) -> Result<Prediction, LabelDecodeError> {
  decode_label(distribution, &BLOOD_GROUPS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn picks_highest_score() {
    let distribution = [0.05, 0.05, 0.6, 0.05, 0.05, 0.05, 0.05, 0.1];
    let prediction = decode_blood_group(&distribution).unwrap();
    assert_eq!(prediction.blood_group, BloodGroup::BPositive);
    assert_eq!(prediction.confidence, 0.6);
  }

  #[test]
  fn tie_keeps_first_occurrence() {
    let distribution = [0.3, 0.1, 0.1, 0.3, 0.05, 0.05, 0.05, 0.05];
    let prediction = decode_blood_group(&distribution).unwrap();
    assert_eq!(prediction.blood_group, BloodGroup::APositive);
    assert_eq!(prediction.confidence, 0.3);
  }

  #[test]
  fn length_mismatch_is_rejected() {
    let seven = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.4];
    match decode_blood_group(&seven) {
      Err(LabelDecodeError::LabelCountMismatch { outputs, labels }) => {
        assert_eq!(outputs, 7);
        assert_eq!(labels, 8);
      }
      other => panic!("预期长度不符错误, 实际: {:?}", other),
    }
  }

  #[test]
  fn empty_distribution_is_rejected() {
    assert!(matches!(
      decode_label(&[], &[]),
      Err(LabelDecodeError::EmptyDistribution)
    ));
  }

  #[test]
  fn out_of_range_score_passes_through() {
    let distribution = [0.0, 0.0, 0.0, 0.0, 1.7, 0.0, 0.0, 0.0];
    let prediction = decode_blood_group(&distribution).unwrap();
    assert_eq!(prediction.blood_group, BloodGroup::AbPositive);
    assert_eq!(prediction.confidence, 1.7);
  }

  #[test]
  fn last_index_can_win() {
    let distribution = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.9];
    let prediction = decode_blood_group(&distribution).unwrap();
    assert_eq!(prediction.blood_group, BloodGroup::ONegative);
  }
}
