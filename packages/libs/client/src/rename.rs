//! 스트림/파이프라인 이름 변경
//!
//! 모델 하나는 같은 이름의 스트림과 파이프라인으로 배포됩니다. 이름을 바꾸면
//! 파이프라인의 sink와 이 스트림을 읽는 다른 파이프라인의 SQL도 함께 바꿉니다.

use dct_core::pipeline::{pipeline_description, replace_sink, replace_source};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::api::ControlPlane;
use crate::error::{ApiError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub stream_id: String,
    pub pipeline_id: String,

    /// 소스 이름을 바꾼 하위 파이프라인 수
    pub renamed_sources: usize,
}

pub async fn rename_relation<C: ControlPlane + ?Sized>(
    control: &C,
    from: &str,
    to: &str,
) -> Result<RenameReport> {
    if to.trim().is_empty() {
        return Err(ApiError::InvalidRequest {
            reason: format!("cannot rename '{}' to an empty name", from),
        });
    }

    let stream_id = control.get_stream_id(from).await?.ok_or_else(|| ApiError::ResourceNotFound {
        reason: format!("cannot rename '{}': stream does not exist", from),
    })?;
    control.update_stream(&stream_id, json!({ "name": to })).await?;
    debug!("Renamed stream '{}' to '{}'", from, to);

    let pipeline_id = control
        .get_pipeline_id(from)
        .await?
        .ok_or_else(|| ApiError::ResourceNotFound {
            reason: format!("cannot rename '{}': pipeline does not exist", from),
        })?;
    let pipeline = control.get_pipeline(&pipeline_id).await?;
    if pipeline.sql.is_empty() {
        return Err(ApiError::InvalidResponse(format!(
            "cannot rename '{}': pipeline returned no sql",
            from
        )));
    }

    control
        .update_pipeline(
            &pipeline_id,
            json!({
                "name": to,
                "sql": replace_sink(from, to, &pipeline.sql),
                "description": pipeline_description(to),
            }),
        )
        .await?;
    debug!("Renamed pipeline '{}' to '{}'", from, to);

    // 이 스트림을 소스로 읽는 파이프라인
    let mut renamed_sources = 0;
    for summary in control.list_pipelines().await?.items {
        let streams = control.get_associated_streams(&summary.id).await?;
        let reads_stream = streams
            .items
            .iter()
            .any(|s| s.is_source && s.stream_id == stream_id);
        if !reads_stream {
            continue;
        }

        let downstream = control.get_pipeline(&summary.id).await?;
        if downstream.sql.is_empty() {
            continue;
        }
        control
            .update_pipeline(
                &summary.id,
                json!({ "sql": replace_source(from, to, &downstream.sql) }),
            )
            .await?;
        renamed_sources += 1;
    }
    debug!(
        "Renamed sources from '{}' to '{}' in {} pipelines",
        from, to, renamed_sources
    );

    Ok(RenameReport {
        stream_id,
        pipeline_id,
        renamed_sources,
    })
}
