//! 시드 적재 명령어

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use dct_client::{create_seed_table, send_seed_as_events, SeedTable};
use serde_json::json;
use tracing::info;

use super::{http, print_json, OutputFormat};
use crate::context::EffectiveContext;

/// `column=TYPE` 형식의 컬럼 타입 override 파싱
pub fn parse_column_types(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((column, type_text)) if !column.trim().is_empty() => {
                Ok((column.trim().to_string(), type_text.trim().to_string()))
            }
            _ => Err(anyhow::anyhow!("invalid column type '{}', expected column=TYPE", pair)),
        })
        .collect()
}

/// `dct seed`
///
/// CSV를 읽어 연결과 스트림을 만들고 모든 행을 이벤트로 보냅니다.
pub async fn seed(
    ctx: &EffectiveContext,
    format: OutputFormat,
    file: &Path,
    name: Option<&str>,
    column_types: &[String],
) -> anyhow::Result<()> {
    let overrides = parse_column_types(column_types)?;
    let table = SeedTable::load(file, name)
        .with_context(|| format!("failed to read seed {}", file.display()))?;
    let client = http::control_plane(ctx)?;

    info!(seed = %table.name, rows = table.rows.len(), "creating seed connection");
    create_seed_table(&client, &table, &overrides).await?;
    let report = send_seed_as_events(&client, &table).await?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "name": table.name,
            "connection_id": report.connection_id,
            "sent": report.sent,
            "received": report.received,
        }))?,
        OutputFormat::Text => println!(
            "Seeded '{}': sent {} events, {} received",
            table.name, report.sent, report.received
        ),
    }
    Ok(())
}
