// 该文件是 Xueyin （血印） 项目的一部分。
// src/output/save_report_file.rs - 保存报告文件
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

use std::path::Path;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::output::ReportSink;
use crate::report::PredictionReport;
use crate::{FromUrl, FromUrlWithScheme};

/// 把报告以 JSON 写入固定路径，URL 形如 `report:/var/run/result.json`。
/// 带 `?compact` 时写单行 JSON，否则缩进排版。
pub struct SaveReportFileOutput {
  path: String,
  compact: bool,
}

#[derive(Error, Debug)]
pub enum SaveReportFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveReportFileOutput {
  const SCHEME: &'static str = "report";
}

impl FromUrl for SaveReportFileOutput {
  type Error = SaveReportFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveReportFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let compact = uri.query_pairs().any(|(key, _)| key == "compact");

    Ok(SaveReportFileOutput {
      path: uri.path().to_string(),
      compact,
    })
  }
}

impl ReportSink for SaveReportFileOutput {
  type Error = SaveReportFileError;

  fn write_report(&self, report: &PredictionReport) -> Result<(), Self::Error> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveReportFileError::IoError)?;
    }

    let json = if self.compact {
      serde_json::to_string(report).map_err(SaveReportFileError::JsonError)?
    } else {
      serde_json::to_string_pretty(report).map_err(SaveReportFileError::JsonError)?
    };

    std::fs::write(&self.path, json).map_err(SaveReportFileError::IoError)?;

    warn!("保存报告到文件: {}", self.path);

    Ok(())
  }
}
