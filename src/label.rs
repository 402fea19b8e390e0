// 该文件是 Xueyin （血印） 项目的一部分。
// src/label.rs - 血型标签集
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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ABO/Rh 血型标签。
///
/// 标签顺序与分类器输出向量的下标一一对应，属于进程级常量，
/// 任何改动都意味着模型与流水线版本不再匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
  #[serde(rename = "A+")]
  APositive,
  #[serde(rename = "A-")]
  ANegative,
  #[serde(rename = "B+")]
  BPositive,
  #[serde(rename = "B-")]
  BNegative,
  #[serde(rename = "AB+")]
  AbPositive,
  #[serde(rename = "AB-")]
  AbNegative,
  #[serde(rename = "O+")]
  OPositive,
  #[serde(rename = "O-")]
  ONegative,
}

/// 固定的血型标签集，下标即分类器输出下标
pub const BLOOD_GROUPS: [BloodGroup; 8] = [
  BloodGroup::APositive,
  BloodGroup::ANegative,
  BloodGroup::BPositive,
  BloodGroup::BNegative,
  BloodGroup::AbPositive,
  BloodGroup::AbNegative,
  BloodGroup::OPositive,
  BloodGroup::ONegative,
];

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("未知血型标签: {0}")]
  UnknownLabel(String),
}

impl BloodGroup {
  /// 标签文本
  pub fn as_str(&self) -> &'static str {
    match self {
      BloodGroup::APositive => "A+",
      BloodGroup::ANegative => "A-",
      BloodGroup::BPositive => "B+",
      BloodGroup::BNegative => "B-",
      BloodGroup::AbPositive => "AB+",
      BloodGroup::AbNegative => "AB-",
      BloodGroup::OPositive => "O+",
      BloodGroup::ONegative => "O-",
    }
  }

  /// 标签在标签集中的下标
  pub fn index(&self) -> usize {
    match self {
      BloodGroup::APositive => 0,
      BloodGroup::ANegative => 1,
      BloodGroup::BPositive => 2,
      BloodGroup::BNegative => 3,
      BloodGroup::AbPositive => 4,
      BloodGroup::AbNegative => 5,
      BloodGroup::OPositive => 6,
      BloodGroup::ONegative => 7,
    }
  }

  /// 按下标取标签，越界返回 None
  pub fn from_index(index: usize) -> Option<BloodGroup> {
    BLOOD_GROUPS.get(index).copied()
  }

  /// 可向该血型供血的血型列表
  pub fn compatible_donors(&self) -> &'static [BloodGroup] {
    use BloodGroup::*;
    match self {
      APositive => &[ANegative, APositive, ONegative, OPositive],
      ANegative => &[ANegative, ONegative],
      BPositive => &[BNegative, BPositive, ONegative, OPositive],
      BNegative => &[BNegative, ONegative],
      AbPositive => &[
        ANegative, APositive, BNegative, BPositive, AbNegative, AbPositive, ONegative, OPositive,
      ],
      AbNegative => &[ANegative, BNegative, AbNegative, ONegative],
      OPositive => &[ONegative, OPositive],
      ONegative => &[ONegative],
    }
  }
}

impl std::fmt::Display for BloodGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for BloodGroup {
  type Err = LabelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    BLOOD_GROUPS
      .iter()
      .find(|group| group.as_str() == s)
      .copied()
      .ok_or_else(|| LabelError::UnknownLabel(s.to_string()))
  }
}
