//! SQL 미리보기 명령어

use std::time::Duration;

use dct_client::preview::run_preview;
use dct_client::StartPosition;
use dct_core::pipeline::replace_disallowed_operations;
use tracing::info;

use super::{http, print_json, OutputFormat};
use crate::context::EffectiveContext;

/// `dct preview`
///
/// `timeout_secs` 동안 결과를 모은 뒤 출력합니다.
pub async fn preview(
    ctx: &EffectiveContext,
    format: OutputFormat,
    sql: &str,
    timeout_secs: u64,
    latest: bool,
) -> anyhow::Result<()> {
    let client = http::control_plane(ctx)?;
    let config = client.config();
    let start = if latest {
        StartPosition::Latest
    } else {
        config.preview_start
    };

    let sql = replace_disallowed_operations(sql);
    let rows = run_preview(
        &client,
        &sql,
        start,
        Duration::from_secs(timeout_secs),
        config.request_timeout(),
    )
    .await?;
    info!(rows = rows.len(), "preview finished");

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            for row in &rows {
                println!("{}", serde_json::to_string(row)?);
            }
        }
    }
    Ok(())
}
