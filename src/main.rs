// 该文件是 Xueyin （血印） 项目的一部分。
// src/main.rs - 项目主程序
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

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use xueyin::{
  FromUrl,
  classifier::ClassifierWrapper,
  input::InputWrapper,
  output::{OutputWrapper, ReportSink},
  pipeline::Pipeline,
  report::ReportMeta,
};

/// Xueyin 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 上传来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 分类器
  #[arg(long, value_name = "CLASSIFIER", default_value = "fallback:")]
  pub classifier: Url,
  /// 报告输出
  #[arg(long, value_name = "REPORT")]
  pub report: Url,
  /// 请求标识前缀
  #[arg(long, value_name = "REQUEST_ID", default_value = "cli")]
  pub request_id: String,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("上传来源: {}", args.input);
  info!("分类器: {}", args.classifier);
  info!("报告输出: {}", args.report);

  let input = InputWrapper::from_url(&args.input)?;
  let classifier = ClassifierWrapper::from_url(&args.classifier)?;
  let sink = OutputWrapper::from_url(&args.report)?;

  let pipeline = Pipeline::new(classifier)?;

  info!("开始预测...");
  let now = std::time::Instant::now();
  let mut count = 0u32;
  for upload in input.into_uploads() {
    count += 1;
    let mut meta = ReportMeta::now(format!("{}-{:04}", args.request_id, count));
    if let Some(source) = upload.source.clone() {
      meta = meta.with_source(source);
    }

    let report = pipeline.run(upload, meta)?;
    let elapsed = now.elapsed();
    info!("预测完成, 耗时: {:.2?}", elapsed);
    info!(
      "血型: {} (置信度 {:.4}), 可接受供血: {:?}",
      report.blood_group,
      report.confidence,
      report
        .compatible_groups
        .iter()
        .map(|group| group.as_str())
        .collect::<Vec<_>>()
    );

    sink.write_report(&report)?;
  }

  if count == 0 {
    warn!("输入源未产出任何上传");
  }

  Ok(())
}
