// 该文件是 Xueyin （血印） 项目的一部分。
// src/classifier/fallback.rs - 后备分类器
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

//! 后备分类器。
//!
//! 在没有训练模型可部署的环境里充当推理后端：忽略像素内容，
//! 随机抽取一个血型并赋予 `[0.85, 0.98)` 区间内的置信度，剩余
//! 概率质量均匀摊给其余标签。输出仍然是一条合法的概率分布，
//! 下游的解码与装配逻辑可以原样联调。
//!
//! URL 形如 `fallback:?seed=42&width=224&height=224`：
//!
//! - `seed`: 固定随机种子，得到可复现的抽取序列（联调、测试用）；
//!   缺省时从系统熵初始化。
//! - `width` / `height`: 声明的输入分辨率，缺省 224。
//!
//! # 示例
//!
//! ```no_run
//! use url::Url;
//! use xueyin::FromUrl;
//! use xueyin::classifier::{Classifier, FallbackClassifier};
//!
//! let url = Url::parse("fallback:?seed=42").unwrap();
//! let classifier = FallbackClassifier::from_url(&url).unwrap();
//! println!("输入形状: {}", classifier.input_shape());
//! ```

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::label::BLOOD_GROUPS;
use crate::normalize::DEFAULT_INPUT_SIZE;
use crate::tensor::{InputTensor, TensorShape};
use crate::{FromUrl, FromUrlWithScheme};

const CONFIDENCE_LOW: f32 = 0.85;
const CONFIDENCE_HIGH: f32 = 0.98;

#[derive(Error, Debug)]
pub enum FallbackClassifierError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("查询参数无效: {key}={value}")]
  BadQuery { key: String, value: String },
}

pub struct FallbackClassifier {
  shape: TensorShape,
  rng: Mutex<StdRng>,
}

impl FromUrlWithScheme for FallbackClassifier {
  const SCHEME: &'static str = "fallback";
}

fn parse_seed(key: &str, value: &str) -> Result<u64, FallbackClassifierError> {
  value
    .parse()
    .map_err(|_| FallbackClassifierError::BadQuery {
      key: key.to_string(),
      value: value.to_string(),
    })
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, FallbackClassifierError> {
  match value.parse::<u32>() {
    Ok(dimension) if dimension > 0 => Ok(dimension),
    _ => Err(FallbackClassifierError::BadQuery {
      key: key.to_string(),
      value: value.to_string(),
    }),
  }
}

impl FromUrl for FallbackClassifier {
  type Error = FallbackClassifierError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FallbackClassifierError::SchemeMismatch);
    }

    let mut seed = None;
    let mut width = DEFAULT_INPUT_SIZE;
    let mut height = DEFAULT_INPUT_SIZE;

    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "seed" => seed = Some(parse_seed(&key, &value)?),
        "width" => width = parse_dimension(&key, &value)?,
        "height" => height = parse_dimension(&key, &value)?,
        _ => {}
      }
    }

    let rng = match seed {
      Some(seed) => {
        info!("后备分类器使用固定种子: {}", seed);
        StdRng::seed_from_u64(seed)
      }
      None => StdRng::from_entropy(),
    };

    Ok(FallbackClassifier {
      shape: TensorShape::nhwc(height as usize, width as usize),
      rng: Mutex::new(rng),
    })
  }
}

impl Classifier for FallbackClassifier {
  type Error = std::convert::Infallible;

  fn input_shape(&self) -> TensorShape {
    self.shape
  }

  fn classify(&self, _tensor: &InputTensor) -> Result<Vec<f32>, Self::Error> {
    let mut rng = self.rng.lock().unwrap();
    let winner = rng.gen_range(0..BLOOD_GROUPS.len());
    let confidence = rng.gen_range(CONFIDENCE_LOW..CONFIDENCE_HIGH);
    let remainder = (1.0 - confidence) / (BLOOD_GROUPS.len() - 1) as f32;

    let mut distribution = vec![remainder; BLOOD_GROUPS.len()];
    distribution[winner] = confidence;

    debug!(
      "后备分类器抽取标签 {} (置信度 {:.4})",
      BLOOD_GROUPS[winner],
      confidence
    );
    Ok(distribution)
  }
}
