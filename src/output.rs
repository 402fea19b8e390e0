// 该文件是 Xueyin （血印） 项目的一部分。
// src/output.rs - 报告输出定义
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
use url::Url;

use crate::FromUrl;
#[cfg(any(feature = "save_report_file", feature = "directory_record"))]
use crate::FromUrlWithScheme;
use crate::report::PredictionReport;

/// 预测报告的统一出口。
pub trait ReportSink: Sized {
  type Error;
  fn write_report(&self, report: &PredictionReport) -> Result<(), Self::Error>;
}

#[cfg(feature = "save_report_file")]
mod save_report_file;
#[cfg(feature = "save_report_file")]
pub use self::save_report_file::{SaveReportFileError, SaveReportFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_report_file")]
  #[error("保存报告文件错误: {0}")]
  SaveReportFileError(#[from] SaveReportFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "save_report_file")]
  SaveReportFileOutput(SaveReportFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_report_file")]
      SaveReportFileOutput::SCHEME => {
        let output = SaveReportFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveReportFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl ReportSink for OutputWrapper {
  type Error = OutputError;

  fn write_report(&self, report: &PredictionReport) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_report_file")]
      OutputWrapper::SaveReportFileOutput(output) => {
        output.write_report(report).map_err(OutputError::from)
      }
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => {
        output.write_report(report).map_err(OutputError::from)
      }
    }
  }
}
