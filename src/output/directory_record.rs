// 该文件是 Xueyin （血印） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::debug;

use crate::output::ReportSink;
use crate::report::PredictionReport;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按日期归档报告，URL 形如 `folder:/var/lib/xueyin/records`。
/// 每份报告落在 `<根目录>/<年>/<月>/<日>/时-分-秒-序号.json`，
/// 序号保证同一秒内的多份报告互不覆盖。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  record_counters: Arc<Mutex<u16>>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      record_counters: Arc::new(Mutex::new(0)),
    })
  }
}

impl DirectoryRecordOutput {
  fn record_id(&self) -> u16 {
    let mut counter = self.record_counters.lock().unwrap();
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  fn record_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.record_id()
    )))
  }
}

impl ReportSink for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn write_report(&self, report: &PredictionReport) -> Result<(), Self::Error> {
    let path = self.record_path()?;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;

    debug!("记录报告: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decode::Prediction;
  use crate::label::BloodGroup;
  use crate::report::{ReportMeta, assemble};

  fn sample_report() -> PredictionReport {
    let meta = ReportMeta {
      request_id: "req-2".to_string(),
      timestamp_ms: 42,
      source: Some("stdin".to_string()),
    };
    let prediction = Prediction {
      blood_group: BloodGroup::ONegative,
      confidence: 0.88,
    };
    assemble(
      meta,
      prediction,
      &[0.01, 0.02, 0.01, 0.01, 0.02, 0.02, 0.03, 0.88],
    )
    .unwrap()
  }

  fn collect_json_files(base: &PathBuf) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![base.clone()];
    while let Some(dir) = stack.pop() {
      for entry in std::fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else if path.extension().is_some_and(|ext| ext == "json") {
          found.push(path);
        }
      }
    }
    found
  }

  #[test]
  fn rejects_other_schemes() {
    let url = url::Url::parse("report:/tmp/result.json").unwrap();
    assert!(matches!(
      DirectoryRecordOutput::from_url(&url),
      Err(DirectoryRecordOutputError::SchemeMismatch)
    ));
  }

  #[test]
  fn records_land_in_dated_directories() {
    let base = std::env::temp_dir().join(format!("xueyin-records-{}", std::process::id()));
    let url = url::Url::parse(&format!("folder:{}", base.display())).unwrap();

    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.write_report(&sample_report()).unwrap();
    output.write_report(&sample_report()).unwrap();

    let files = collect_json_files(&base);
    assert_eq!(files.len(), 2);

    let now = Utc::now();
    let dated = base
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()));
    assert!(dated.exists());

    let text = std::fs::read_to_string(&files[0]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["blood_group"], "O-");

    std::fs::remove_dir_all(&base).ok();
  }
}
