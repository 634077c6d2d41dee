//! 컨트롤 플레인 API 클라이언트
//!
//! 스트림, 파이프라인, 미리보기 토큰, 선언형 apply 엔드포인트를 다룹니다.
//! 모든 요청은 `Authorization: Bearer <access_token>` 헤더를 사용합니다.

use async_trait::async_trait;
use dct_core::reconcile::ApplyOutcome;
use dct_core::schema::{Schema, SchemaField};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::{ClientConfig, StartPosition};
use crate::error::{ApiError, Result};
use crate::responses::{
    AccountInfo, ApiResponse, AssociatedStream, CreatedResource, DataPlaneTokenResponse,
    OutputStreamResponse, PipelineInfo, PreviewDependencies, PreviewTokensResponse,
    ResourceSummary, SendEventsResponse, StreamInfo,
};

/// 컨트롤 플레인 작업
///
/// 변경 감지기와 미리보기는 이 trait에만 의존하므로 테스트에서 대체할 수 있습니다.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Streams
    // ─────────────────────────────────────────────────────────────────────────
    async fn list_streams(&self) -> Result<ApiResponse<ResourceSummary>>;

    async fn get_stream(&self, stream_id: &str) -> Result<StreamInfo>;

    /// SQL의 출력 스키마 계산 (`INSERT INTO ...` 형태)
    async fn get_stream_from_sql(&self, sql: &str) -> Result<OutputStreamResponse>;

    async fn create_stream(&self, name: &str, schema: &Schema, watermark: Option<&str>) -> Result<Value>;

    async fn update_stream(&self, stream_id: &str, props: Value) -> Result<Value>;

    async fn delete_stream(&self, stream_id: &str) -> Result<()>;

    async fn get_clear_stream_token(&self, stream_id: &str) -> Result<DataPlaneTokenResponse>;

    /// 이름으로 스트림 ID 조회 (같은 이름이 여럿이면 마지막 항목)
    async fn get_stream_id(&self, name: &str) -> Result<Option<String>> {
        let streams = self.list_streams().await?;
        Ok(find_id_by_name(&streams.items, name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipelines
    // ─────────────────────────────────────────────────────────────────────────
    async fn list_pipelines(&self) -> Result<ApiResponse<ResourceSummary>>;

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<PipelineInfo>;

    async fn create_pipeline(&self, sql: &str, name: &str, description: &str) -> Result<Value>;

    async fn update_pipeline(&self, pipeline_id: &str, props: Value) -> Result<Value>;

    async fn activate_pipeline(&self, pipeline_id: &str) -> Result<Value>;

    async fn deactivate_pipeline(&self, pipeline_id: &str) -> Result<Value>;

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()>;

    async fn get_pipeline_id(&self, name: &str) -> Result<Option<String>> {
        let pipelines = self.list_pipelines().await?;
        Ok(find_id_by_name(&pipelines.items, name))
    }

    /// 파이프라인의 입출력 스트림
    async fn get_associated_streams(&self, pipeline_id: &str) -> Result<ApiResponse<AssociatedStream>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Connections
    // ─────────────────────────────────────────────────────────────────────────
    async fn list_connections(&self) -> Result<ApiResponse<ResourceSummary>>;

    /// 이름으로 연결 ID 조회 (첫 번째 항목)
    async fn get_connection_id(&self, name: &str) -> Result<Option<String>> {
        let connections = self.list_connections().await?;
        Ok(connections
            .items
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.clone()))
    }

    /// REST 소스 연결과 같은 이름의 스트림 생성
    async fn create_connection(&self, name: &str, fields: &[SchemaField]) -> Result<CreatedResource>;

    async fn activate_connection(&self, connection_id: &str) -> Result<Value>;

    async fn deactivate_connection(&self, connection_id: &str) -> Result<Value>;

    async fn delete_connection(&self, connection_id: &str) -> Result<()>;

    /// 연결로 이벤트 전송 (수신된 이벤트 수 반환)
    async fn send_events(&self, connection_id: &str, events: &[Map<String, Value>]) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Preview
    // ─────────────────────────────────────────────────────────────────────────
    async fn get_preview_dependencies(&self, sql: &str) -> Result<PreviewDependencies>;

    async fn get_preview_tokens(
        &self,
        sql: &str,
        start: StartPosition,
        input_streams: &[String],
    ) -> Result<PreviewTokensResponse>;

    async fn get_account_info(&self) -> Result<AccountInfo>;

    // ─────────────────────────────────────────────────────────────────────────
    // Declarative
    // ─────────────────────────────────────────────────────────────────────────
    async fn apply(&self, documents: &[Value], dry_run: bool) -> Result<Vec<ApplyOutcome>>;

    async fn test_connection(&self) -> Result<()>;
}

fn find_id_by_name(items: &[ResourceSummary], name: &str) -> Option<String> {
    items
        .iter()
        .rev()
        .find(|item| item.name == name)
        .map(|item| item.id.clone())
}

/// 미리보기 토큰 요청 본문
fn preview_tokens_payload(sql: &str, start: StartPosition, input_streams: &[String]) -> Value {
    let start_positions: Map<String, Value> = input_streams
        .iter()
        .map(|stream| {
            (
                stream.clone(),
                json!({ "type": "TAG", "value": start.as_str() }),
            )
        })
        .collect();

    json!({ "sql": sql, "start_positions": start_positions })
}

/// 스트림 생성 요청 본문
fn create_stream_payload(name: &str, schema: &Schema, watermark: Option<&str>) -> Value {
    let mut payload = json!({
        "name": name,
        "schema_v2": schema.to_dict(),
    });
    if let Some(watermark) = watermark {
        payload["watermark"] = Value::from(watermark);
    }
    payload
}

/// 연결 생성 요청 본문 (필드는 이름과 타입만)
fn create_connection_payload(name: &str, fields: &[SchemaField]) -> Value {
    let schema: Vec<Value> = fields
        .iter()
        .map(|field| {
            let mut entry = json!({ "name": field.name() });
            if let Some(field_type) = field.field_type() {
                entry["type"] = Value::from(field_type.to_string());
            }
            entry
        })
        .collect();

    json!({
        "name": name,
        "connector": "rest",
        "type": "source",
        "schema": schema,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// 응답을 JSON으로 읽고, 실패 상태 코드는 `ApiError`로 변환
pub(crate) async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), text));
    }
    let body = resp.json::<T>().await?;
    Ok(body)
}

/// 본문이 없는 응답
pub(crate) async fn send_empty(req: RequestBuilder) -> Result<()> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), text));
    }
    Ok(())
}

/// reqwest 기반 컨트롤 플레인 클라이언트
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        debug!(method = "GET", path, "control plane request");
        self.http
            .get(self.url(path))
            .bearer_auth(&self.config.access_token)
            .header("accept", "application/json")
    }

    fn post(&self, path: &str, payload: &Value) -> RequestBuilder {
        debug!(method = "POST", path, "control plane request");
        self.http
            .post(self.url(path))
            .bearer_auth(&self.config.access_token)
            .header("accept", "application/json")
            .json(payload)
    }

    fn patch(&self, path: &str, payload: &Value) -> RequestBuilder {
        debug!(method = "PATCH", path, "control plane request");
        self.http
            .patch(self.url(path))
            .bearer_auth(&self.config.access_token)
            .header("accept", "application/json")
            .json(payload)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        debug!(method = "DELETE", path, "control plane request");
        self.http
            .delete(self.url(path))
            .bearer_auth(&self.config.access_token)
            .header("accept", "application/json")
    }
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn list_streams(&self) -> Result<ApiResponse<ResourceSummary>> {
        send_json(self.get("/streams")).await
    }

    async fn get_stream(&self, stream_id: &str) -> Result<StreamInfo> {
        send_json(self.get(&format!("/streams/{}", stream_id))).await
    }

    async fn get_stream_from_sql(&self, sql: &str) -> Result<OutputStreamResponse> {
        send_json(self.post("/pipelines/outputStream", &json!({ "sql": sql }))).await
    }

    async fn create_stream(&self, name: &str, schema: &Schema, watermark: Option<&str>) -> Result<Value> {
        let payload = create_stream_payload(name, schema, watermark);
        send_json(self.post("/streams", &payload)).await
    }

    async fn update_stream(&self, stream_id: &str, props: Value) -> Result<Value> {
        send_json(self.patch(&format!("/streams/{}", stream_id), &props)).await
    }

    async fn delete_stream(&self, stream_id: &str) -> Result<()> {
        send_empty(self.delete(&format!("/streams/{}", stream_id))).await
    }

    async fn get_clear_stream_token(&self, stream_id: &str) -> Result<DataPlaneTokenResponse> {
        send_json(self.post(&format!("/streams/{}/clear/token", stream_id), &json!({}))).await
    }

    async fn list_pipelines(&self) -> Result<ApiResponse<ResourceSummary>> {
        send_json(self.get("/pipelines")).await
    }

    async fn get_pipeline(&self, pipeline_id: &str) -> Result<PipelineInfo> {
        send_json(self.get(&format!("/pipelines/{}", pipeline_id))).await
    }

    async fn create_pipeline(&self, sql: &str, name: &str, description: &str) -> Result<Value> {
        let payload = json!({ "sql": sql, "name": name, "description": description });
        send_json(self.post("/pipelines", &payload)).await
    }

    async fn update_pipeline(&self, pipeline_id: &str, props: Value) -> Result<Value> {
        send_json(self.patch(&format!("/pipelines/{}", pipeline_id), &props)).await
    }

    async fn activate_pipeline(&self, pipeline_id: &str) -> Result<Value> {
        send_json(self.post(&format!("/pipelines/{}/activate", pipeline_id), &json!({}))).await
    }

    async fn deactivate_pipeline(&self, pipeline_id: &str) -> Result<Value> {
        send_json(self.post(&format!("/pipelines/{}/deactivate", pipeline_id), &json!({}))).await
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()> {
        send_empty(self.delete(&format!("/pipelines/{}", pipeline_id))).await
    }

    async fn get_associated_streams(&self, pipeline_id: &str) -> Result<ApiResponse<AssociatedStream>> {
        send_json(self.get(&format!("/pipelines/{}/streams", pipeline_id))).await
    }

    async fn list_connections(&self) -> Result<ApiResponse<ResourceSummary>> {
        send_json(self.get("/connections")).await
    }

    async fn create_connection(&self, name: &str, fields: &[SchemaField]) -> Result<CreatedResource> {
        let payload = create_connection_payload(name, fields);
        let req = self.post("/connections", &payload).query(&[("stream_name", name)]);
        send_json(req).await
    }

    async fn activate_connection(&self, connection_id: &str) -> Result<Value> {
        send_json(self.post(&format!("/connections/{}/activate", connection_id), &json!({}))).await
    }

    async fn deactivate_connection(&self, connection_id: &str) -> Result<Value> {
        send_json(self.post(&format!("/connections/{}/deactivate", connection_id), &json!({}))).await
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<()> {
        send_empty(self.delete(&format!("/connections/{}", connection_id))).await
    }

    async fn send_events(&self, connection_id: &str, events: &[Map<String, Value>]) -> Result<u64> {
        let payload = json!({ "events": events });
        let resp: SendEventsResponse =
            send_json(self.post(&format!("/connections/{}/events", connection_id), &payload)).await?;
        Ok(resp.count)
    }

    async fn get_preview_dependencies(&self, sql: &str) -> Result<PreviewDependencies> {
        send_json(self.post("/preview/dependencies", &json!({ "sql": sql }))).await
    }

    async fn get_preview_tokens(
        &self,
        sql: &str,
        start: StartPosition,
        input_streams: &[String],
    ) -> Result<PreviewTokensResponse> {
        let payload = preview_tokens_payload(sql, start, input_streams);
        send_json(self.post("/preview/tokens", &payload)).await
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        send_json(self.get(&format!("/accounts/{}", self.config.account_name))).await
    }

    async fn apply(&self, documents: &[Value], dry_run: bool) -> Result<Vec<ApplyOutcome>> {
        let path = if dry_run { "/apply?dry_run=true" } else { "/apply" };
        send_json(self.post(path, &Value::Array(documents.to_vec()))).await
    }

    async fn test_connection(&self) -> Result<()> {
        send_empty(self.get("/streams")).await
    }
}
