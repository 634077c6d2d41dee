//! 스트림 조회 명령어

use dct_client::ControlPlane;
use dct_core::Schema;

use super::{http, print_json, OutputFormat};
use crate::context::EffectiveContext;

pub async fn list(ctx: &EffectiveContext, format: OutputFormat) -> anyhow::Result<()> {
    let client = http::control_plane(ctx)?;
    let streams = client.list_streams().await?;

    match format {
        OutputFormat::Json => print_json(&streams.items)?,
        OutputFormat::Text => {
            if streams.items.is_empty() {
                println!("No streams.");
            }
            for s in &streams.items {
                println!("{}  {}", s.id, s.name);
            }
        }
    }
    Ok(())
}

pub async fn show(ctx: &EffectiveContext, format: OutputFormat, name: &str) -> anyhow::Result<()> {
    let client = http::control_plane(ctx)?;
    let Some(stream_id) = client.get_stream_id(name).await? else {
        anyhow::bail!("Stream '{}' not found", name);
    };
    let stream = client.get_stream(&stream_id).await?;

    if format == OutputFormat::Json {
        return print_json(&stream);
    }

    println!("Stream: {} ({})", stream.name, stream.id);
    println!("  watermark: {}", stream.watermark.as_deref().unwrap_or("(none)"));
    match &stream.schema_v2 {
        Some(v2) => {
            let schema = Schema::from_json(v2)?;
            println!("{}", schema.pretty(1, Some("schema")));
            if !schema.constraints.primary_key.is_empty() {
                println!("  primary key: {}", schema.constraints.primary_key.join(", "));
            }
        }
        None => {
            for field in &stream.schema {
                println!("  {}", field);
            }
        }
    }
    Ok(())
}
