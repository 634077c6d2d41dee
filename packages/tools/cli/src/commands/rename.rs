//! 이름 변경 명령어

use dct_client::rename_relation;
use tracing::info;

use super::{http, print_json, OutputFormat};
use crate::context::EffectiveContext;

/// `dct rename`
pub async fn rename(
    ctx: &EffectiveContext,
    format: OutputFormat,
    from: &str,
    to: &str,
) -> anyhow::Result<()> {
    let client = http::control_plane(ctx)?;

    info!(%from, %to, "renaming stream and pipeline");
    let report = rename_relation(&client, from, to).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => println!(
            "Renamed '{}' to '{}' (stream {}, pipeline {}, {} downstream pipelines updated)",
            from, to, report.stream_id, report.pipeline_id, report.renamed_sources
        ),
    }
    Ok(())
}
