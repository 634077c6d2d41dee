//! 모델 변경 감지 명령어

use std::path::Path;

use anyhow::Context as _;
use dct_client::DetectionStrategy;
use serde_json::json;
use tracing::info;

use super::{http, print_json, OutputFormat};
use crate::context::EffectiveContext;
use crate::model::load_model;

/// `dct diff`
///
/// 스키마 버전에 따라 감지 전략을 고르고, 원격 리소스와의 차이를 출력합니다.
pub async fn diff(
    ctx: &EffectiveContext,
    format: OutputFormat,
    model_path: &Path,
    relation: Option<&str>,
) -> anyhow::Result<()> {
    let model = load_model(model_path, relation)?;
    let client = http::control_plane(ctx)?;

    let strategy = DetectionStrategy::for_schema_version(client.config().schema_version);
    info!(model = %model.name, %strategy, "detecting changes");

    let detection = strategy
        .detector(&client)
        .detect(&model)
        .await
        .with_context(|| format!("change detection failed for '{}'", model.name))?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "name": model.name,
            "strategy": strategy,
            "changed": detection.changed,
            "reason": detection.reason,
        }))?,
        OutputFormat::Text => {
            let status = if detection.changed { "changed" } else { "unchanged" };
            println!("{}: {} ({})", model.name, status, detection.reason);
        }
    }
    Ok(())
}
