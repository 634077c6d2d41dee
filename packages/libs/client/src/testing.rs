//! 테스트용 메모리 내 컨트롤 플레인

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dct_core::reconcile::ApplyOutcome;
use dct_core::schema::{Schema, SchemaField};
use serde_json::{Map, Value};

use crate::api::ControlPlane;
use crate::config::StartPosition;
use crate::error::{ApiError, Result};
use crate::responses::{
    AccountInfo, ApiResponse, AssociatedStream, CreatedResource, DataPlaneTokenResponse,
    OutputStreamResponse, PipelineInfo, PreviewDependencies, PreviewTokensResponse,
    ResourceSummary, StreamInfo,
};

/// 호출 기록을 남기는 컨트롤 플레인
#[derive(Default)]
pub(crate) struct MemoryControlPlane {
    pub streams: Vec<StreamInfo>,
    pub pipelines: Vec<PipelineInfo>,
    pub associations: HashMap<String, Vec<AssociatedStream>>,
    pub connections: Mutex<Vec<ResourceSummary>>,

    /// `send_events` 응답 수 (없으면 받은 그대로)
    pub received_override: Option<u64>,

    pub calls: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, Value)>>,
    pub created_fields: Mutex<Vec<SchemaField>>,
    pub sent: Mutex<Vec<Map<String, Value>>>,
}

impl MemoryControlPlane {
    pub fn stream(id: &str, name: &str) -> StreamInfo {
        StreamInfo {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            watermark: None,
            schema: Vec::new(),
            schema_v2: None,
        }
    }

    pub fn pipeline(id: &str, name: &str, sql: &str) -> PipelineInfo {
        PipelineInfo {
            id: id.to_string(),
            name: name.to_string(),
            sql: sql.to_string(),
            description: None,
            actual_state: None,
            target_state: None,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.updates.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unsupported<T>() -> Result<T> {
    Err(ApiError::InvalidRequest {
        reason: "unsupported in memory control plane".to_string(),
    })
}

fn summaries<'a>(items: impl Iterator<Item = (&'a String, &'a String)>) -> ApiResponse<ResourceSummary> {
    ApiResponse {
        items: items
            .map(|(id, name)| ResourceSummary {
                id: id.clone(),
                name: name.clone(),
            })
            .collect(),
        next_page_token: None,
    }
}

#[async_trait]
impl ControlPlane for MemoryControlPlane {
    async fn list_streams(&self) -> Result<ApiResponse<ResourceSummary>> {
        Ok(summaries(self.streams.iter().map(|s| (&s.id, &s.name))))
    }

    async fn get_stream(&self, stream_id: &str) -> Result<StreamInfo> {
        self.streams
            .iter()
            .find(|s| s.id == stream_id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "stream not found"))
    }

    async fn get_stream_from_sql(&self, _: &str) -> Result<OutputStreamResponse> {
        unsupported()
    }

    async fn create_stream(&self, _: &str, _: &Schema, _: Option<&str>) -> Result<Value> {
        unsupported()
    }

    async fn update_stream(&self, stream_id: &str, props: Value) -> Result<Value> {
        self.record(format!("update_stream {}", stream_id));
        self.updates.lock().unwrap().push((stream_id.to_string(), props.clone()));
        Ok(props)
    }

    async fn delete_stream(&self, _: &str) -> Result<()> {
        unsupported()
    }

    async fn get_clear_stream_token(&self, _: &str) -> Result<DataPlaneTokenResponse> {
        unsupported()
    }

    async fn list_pipelines(&self) -> Result<ApiResponse<ResourceSummary>> {
        Ok(summaries(self.pipelines.iter().map(|p| (&p.id, &p.name))))
    }

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<PipelineInfo> {
        self.pipelines
            .iter()
            .find(|p| p.id == pipeline_id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "pipeline not found"))
    }

    async fn create_pipeline(&self, _: &str, _: &str, _: &str) -> Result<Value> {
        unsupported()
    }

    async fn update_pipeline(&self, pipeline_id: &str, props: Value) -> Result<Value> {
        self.record(format!("update_pipeline {}", pipeline_id));
        self.updates.lock().unwrap().push((pipeline_id.to_string(), props.clone()));
        Ok(props)
    }

    async fn activate_pipeline(&self, _: &str) -> Result<Value> {
        unsupported()
    }

    async fn deactivate_pipeline(&self, _: &str) -> Result<Value> {
        unsupported()
    }

    async fn delete_pipeline(&self, _: &str) -> Result<()> {
        unsupported()
    }

    async fn get_associated_streams(&self, pipeline_id: &str) -> Result<ApiResponse<AssociatedStream>> {
        Ok(ApiResponse {
            items: self.associations.get(pipeline_id).cloned().unwrap_or_default(),
            next_page_token: None,
        })
    }

    async fn list_connections(&self) -> Result<ApiResponse<ResourceSummary>> {
        Ok(ApiResponse {
            items: self.connections.lock().unwrap().clone(),
            next_page_token: None,
        })
    }

    async fn create_connection(&self, name: &str, fields: &[SchemaField]) -> Result<CreatedResource> {
        let mut connections = self.connections.lock().unwrap();
        let id = format!("conn-{}", connections.len() + 1);
        connections.push(ResourceSummary {
            id: id.clone(),
            name: name.to_string(),
        });
        self.created_fields.lock().unwrap().extend(fields.iter().cloned());
        self.record(format!("create_connection {}", name));
        Ok(CreatedResource { id })
    }

    async fn activate_connection(&self, connection_id: &str) -> Result<Value> {
        self.record(format!("activate_connection {}", connection_id));
        Ok(Value::Null)
    }

    async fn deactivate_connection(&self, connection_id: &str) -> Result<Value> {
        self.record(format!("deactivate_connection {}", connection_id));
        Ok(Value::Null)
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<()> {
        self.record(format!("delete_connection {}", connection_id));
        Ok(())
    }

    async fn send_events(&self, connection_id: &str, events: &[Map<String, Value>]) -> Result<u64> {
        self.record(format!("send_events {}", connection_id));
        self.sent.lock().unwrap().extend(events.iter().cloned());
        Ok(self.received_override.unwrap_or(events.len() as u64))
    }

    async fn get_preview_dependencies(&self, _: &str) -> Result<PreviewDependencies> {
        unsupported()
    }

    async fn get_preview_tokens(
        &self,
        _: &str,
        _: StartPosition,
        _: &[String],
    ) -> Result<PreviewTokensResponse> {
        unsupported()
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        unsupported()
    }

    async fn apply(&self, _: &[Value], _: bool) -> Result<Vec<ApplyOutcome>> {
        unsupported()
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}
