//! 모델 변경 감지 전략
//!
//! 같은 질문("원격 스트림을 다시 배포해야 하는가?")에 대한 두 가지 구현입니다.
//!
//! - `CrudChangeDetector`: 출력 스키마를 계산한 뒤 원격 파이프라인/스트림을
//!   직접 조회하여 비교합니다 (스키마 버전 `v1`).
//! - `ApplyChangeDetector`: 리소스 문서를 dry-run apply로 보내고 결과를
//!   요약합니다 (스키마 버전 `v2`).
//!
//! 어떤 구현을 쓸지는 `DetectionStrategy::for_schema_version`이 결정합니다.

use std::fmt;

use async_trait::async_trait;
use dct_core::pipeline::wrap_as_pipeline;
use dct_core::reconcile::{
    any_resource_changed, change_reason, ApplyStatus, declarative_resources, ColumnHint, LocalStream,
    RemoteStream,
};
use dct_core::schema::{pretty_fields, Schema, SchemaField};
use dct_core::types::TypeNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ControlPlane;
use crate::config::SchemaVersion;
use crate::error::Result;
use crate::responses::StreamInfo;

/// 변경 감지 대상 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamModel {
    /// 스트림/파이프라인 이름
    pub name: String,

    /// 모델 SQL (`SELECT ...`)
    pub sql: String,

    #[serde(default)]
    pub watermark: Option<String>,

    #[serde(default)]
    pub primary_key: Vec<String>,

    #[serde(default)]
    pub columns: Vec<ColumnHint>,
}

impl StreamModel {
    /// 원격에 저장될 파이프라인 SQL
    pub fn pipeline_sql(&self) -> String {
        wrap_as_pipeline(&self.name, &self.sql)
    }
}

/// 감지 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub changed: bool,

    /// 사람이 읽을 수 있는 판단 근거
    pub reason: String,
}

impl Detection {
    fn changed(reason: impl Into<String>) -> Self {
        Self {
            changed: true,
            reason: reason.into(),
        }
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            reason: "remote resources are up to date".to_string(),
        }
    }
}

/// 변경 감지 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStrategy {
    Crud,
    Apply,
}

impl DetectionStrategy {
    pub fn for_schema_version(version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::V1 => DetectionStrategy::Crud,
            SchemaVersion::V2 => DetectionStrategy::Apply,
        }
    }

    /// 전략에 맞는 감지기 생성
    pub fn detector<'a, C>(self, control: &'a C) -> Box<dyn ChangeDetector + 'a>
    where
        C: ControlPlane + ?Sized,
    {
        debug!(strategy = %self, "creating change detector");
        match self {
            DetectionStrategy::Crud => Box::new(CrudChangeDetector::new(control)),
            DetectionStrategy::Apply => Box::new(ApplyChangeDetector::new(control)),
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStrategy::Crud => f.write_str("crud"),
            DetectionStrategy::Apply => f.write_str("apply"),
        }
    }
}

/// 변경 감지기
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    fn strategy(&self) -> DetectionStrategy;

    async fn detect(&self, model: &StreamModel) -> Result<Detection>;

    async fn has_changed(&self, model: &StreamModel) -> Result<bool> {
        Ok(self.detect(model).await?.changed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared
// ─────────────────────────────────────────────────────────────────────────────

/// `kind`가 없는 필드는 physical로 간주
fn with_default_kind(fields: &[Value]) -> Vec<Value> {
    fields
        .iter()
        .map(|field| {
            let mut field = field.clone();
            if let Some(m) = field.as_object_mut() {
                m.entry("kind").or_insert_with(|| Value::from("physical"));
            }
            field
        })
        .collect()
}

/// 출력 스키마를 계산하여 로컬 스트림 생성
async fn derive_local<C>(control: &C, model: &StreamModel) -> Result<LocalStream>
where
    C: ControlPlane + ?Sized,
{
    let pipeline_sql = model.pipeline_sql();
    let resolved = control.get_stream_from_sql(&pipeline_sql).await?;

    let local = LocalStream::derive(
        pipeline_sql,
        model.watermark.clone(),
        model.primary_key.clone(),
        &model.columns,
        &with_default_kind(&resolved.schema),
    )?;

    let mismatches = local.hint_mismatches();
    if !mismatches.is_empty() {
        let hints: Vec<SchemaField> = mismatches.into_iter().cloned().collect();
        warn!(
            "Column hints for '{}' don't match the resulting schema:\n{}\n{}",
            model.name,
            pretty_fields(&hints, 1, Some("hints")),
            local.schema.pretty(1, Some("schema"))
        );
    }

    Ok(local)
}

/// 원격 스트림의 비교용 스키마
///
/// 워터마크는 스트림 속성으로 따로 비교하므로 비웁니다. 구형 필드 목록은
/// `PRIMARY KEY` 표시를 제약 조건으로 옮깁니다.
fn remote_schema(stream: &StreamInfo) -> Result<Schema> {
    let mut schema = match &stream.schema_v2 {
        Some(v2) => Schema::from_json(v2)?,
        None => {
            let schema = Schema::from_json_components(&with_default_kind(&stream.schema), &[], Vec::new())?;
            let primary_key = schema
                .fields
                .iter()
                .filter(|f| f.field_type().is_some_and(TypeNode::is_primary_key))
                .map(|f| f.name().to_string())
                .collect();
            let mut schema = schema.without_primary_key_markers();
            schema.constraints.primary_key = primary_key;
            schema
        }
    };
    schema.watermarks.clear();
    Ok(schema)
}

// ─────────────────────────────────────────────────────────────────────────────
// CRUD
// ─────────────────────────────────────────────────────────────────────────────

/// 원격 리소스를 직접 조회하는 감지기
pub struct CrudChangeDetector<'a, C: ?Sized> {
    control: &'a C,
}

impl<'a, C: ControlPlane + ?Sized> CrudChangeDetector<'a, C> {
    pub fn new(control: &'a C) -> Self {
        Self { control }
    }

    async fn fetch_remote(&self, name: &str) -> Result<Option<RemoteStream>> {
        let Some(pipeline_id) = self.control.get_pipeline_id(name).await? else {
            debug!(name, "pipeline not found");
            return Ok(None);
        };
        let pipeline = self.control.get_pipeline(&pipeline_id).await?;

        let Some(stream_id) = self.control.get_stream_id(name).await? else {
            debug!(name, "stream not found");
            return Ok(None);
        };
        let stream = self.control.get_stream(&stream_id).await?;

        Ok(Some(RemoteStream {
            sql: pipeline.sql,
            watermark: stream.watermark.clone(),
            schema: remote_schema(&stream)?,
        }))
    }
}

#[async_trait]
impl<C: ControlPlane + ?Sized> ChangeDetector for CrudChangeDetector<'_, C> {
    fn strategy(&self) -> DetectionStrategy {
        DetectionStrategy::Crud
    }

    async fn detect(&self, model: &StreamModel) -> Result<Detection> {
        let local = derive_local(self.control, model).await?;
        let remote = self.fetch_remote(&model.name).await?;

        let detection = match change_reason(&local, remote.as_ref()) {
            Some(reason) => Detection::changed(reason.to_string()),
            None => Detection::unchanged(),
        };
        debug!(name = %model.name, changed = detection.changed, reason = %detection.reason, "crud detection");
        Ok(detection)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Apply
// ─────────────────────────────────────────────────────────────────────────────

fn status_verb(status: ApplyStatus) -> &'static str {
    match status {
        ApplyStatus::Unchanged => "unchanged",
        ApplyStatus::Created => "created",
        ApplyStatus::Updated => "updated",
    }
}

/// dry-run apply 결과로 판단하는 감지기
pub struct ApplyChangeDetector<'a, C: ?Sized> {
    control: &'a C,
}

impl<'a, C: ControlPlane + ?Sized> ApplyChangeDetector<'a, C> {
    pub fn new(control: &'a C) -> Self {
        Self { control }
    }
}

#[async_trait]
impl<C: ControlPlane + ?Sized> ChangeDetector for ApplyChangeDetector<'_, C> {
    fn strategy(&self) -> DetectionStrategy {
        DetectionStrategy::Apply
    }

    async fn detect(&self, model: &StreamModel) -> Result<Detection> {
        let local = derive_local(self.control, model).await?;
        let documents = declarative_resources(&model.name, &local);
        let outcomes = self.control.apply(&documents, true).await?;

        if !any_resource_changed(&outcomes) {
            return Ok(Detection::unchanged());
        }

        let changed: Vec<String> = outcomes
            .iter()
            .filter(|o| o.is_changed())
            .map(|o| {
                format!(
                    "{} '{}' would be {}",
                    o.kind.as_deref().unwrap_or("resource"),
                    o.name.as_deref().unwrap_or(&model.name),
                    status_verb(o.result)
                )
            })
            .collect();
        Ok(Detection::changed(changed.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use dct_core::reconcile::ApplyOutcome;
    use serde_json::{json, Map};

    use super::*;
    use crate::config::StartPosition;
    use crate::error::ApiError;
    use crate::responses::{
        AccountInfo, ApiResponse, AssociatedStream, CreatedResource, DataPlaneTokenResponse,
        OutputStreamResponse, PipelineInfo, PreviewDependencies, PreviewTokensResponse,
        ResourceSummary,
    };

    /// 메모리 내 컨트롤 플레인
    #[derive(Default)]
    struct FakeControlPlane {
        output_schema: Vec<Value>,
        pipeline: Option<PipelineInfo>,
        stream: Option<StreamInfo>,
        apply_results: Vec<ApplyOutcome>,
        applied: Mutex<Vec<Value>>,
    }

    fn unsupported<T>() -> Result<T> {
        Err(ApiError::InvalidRequest {
            reason: "unsupported in fake".to_string(),
        })
    }

    #[async_trait]
    impl ControlPlane for FakeControlPlane {
        async fn list_streams(&self) -> Result<ApiResponse<ResourceSummary>> {
            Ok(ApiResponse {
                items: self
                    .stream
                    .iter()
                    .map(|s| ResourceSummary {
                        id: s.id.clone(),
                        name: s.name.clone(),
                    })
                    .collect(),
                next_page_token: None,
            })
        }

        async fn get_stream(&self, stream_id: &str) -> Result<StreamInfo> {
            self.stream
                .clone()
                .filter(|s| s.id == stream_id)
                .ok_or_else(|| ApiError::from_status(404, "stream not found"))
        }

        async fn get_stream_from_sql(&self, _sql: &str) -> Result<OutputStreamResponse> {
            Ok(OutputStreamResponse {
                schema: self.output_schema.clone(),
            })
        }

        async fn create_stream(&self, _: &str, _: &Schema, _: Option<&str>) -> Result<Value> {
            unsupported()
        }

        async fn update_stream(&self, _: &str, _: Value) -> Result<Value> {
            unsupported()
        }

        async fn delete_stream(&self, _: &str) -> Result<()> {
            unsupported()
        }

        async fn get_clear_stream_token(&self, _: &str) -> Result<DataPlaneTokenResponse> {
            unsupported()
        }

        async fn list_pipelines(&self) -> Result<ApiResponse<ResourceSummary>> {
            Ok(ApiResponse {
                items: self
                    .pipeline
                    .iter()
                    .map(|p| ResourceSummary {
                        id: p.id.clone(),
                        name: p.name.clone(),
                    })
                    .collect(),
                next_page_token: None,
            })
        }

        async fn get_pipeline(&self, pipeline_id: &str) -> Result<PipelineInfo> {
            self.pipeline
                .clone()
                .filter(|p| p.id == pipeline_id)
                .ok_or_else(|| ApiError::from_status(404, "pipeline not found"))
        }

        async fn create_pipeline(&self, _: &str, _: &str, _: &str) -> Result<Value> {
            unsupported()
        }

        async fn update_pipeline(&self, _: &str, _: Value) -> Result<Value> {
            unsupported()
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

        async fn get_associated_streams(&self, _: &str) -> Result<ApiResponse<AssociatedStream>> {
            unsupported()
        }

        async fn list_connections(&self) -> Result<ApiResponse<ResourceSummary>> {
            Ok(ApiResponse::default())
        }

        async fn create_connection(&self, _: &str, _: &[SchemaField]) -> Result<CreatedResource> {
            unsupported()
        }

        async fn activate_connection(&self, _: &str) -> Result<Value> {
            unsupported()
        }

        async fn deactivate_connection(&self, _: &str) -> Result<Value> {
            unsupported()
        }

        async fn delete_connection(&self, _: &str) -> Result<()> {
            unsupported()
        }

        async fn send_events(&self, _: &str, _: &[Map<String, Value>]) -> Result<u64> {
            unsupported()
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

        async fn apply(&self, documents: &[Value], dry_run: bool) -> Result<Vec<ApplyOutcome>> {
            assert!(dry_run);
            self.applied.lock().unwrap().extend(documents.iter().cloned());
            Ok(self.apply_results.clone())
        }

        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }
    }

    fn model() -> StreamModel {
        StreamModel {
            name: "orders_enriched".to_string(),
            sql: "SELECT id, amount FROM orders".to_string(),
            watermark: None,
            primary_key: Vec::new(),
            columns: Vec::new(),
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<Value> {
        pairs
            .iter()
            .map(|(n, t)| json!({"name": n, "type": t}))
            .collect()
    }

    fn remote(pipeline_sql: &str, schema: Vec<Value>) -> FakeControlPlane {
        FakeControlPlane {
            pipeline: Some(PipelineInfo {
                id: "p1".to_string(),
                name: "orders_enriched".to_string(),
                sql: pipeline_sql.to_string(),
                description: None,
                actual_state: None,
                target_state: None,
            }),
            stream: Some(StreamInfo {
                id: "s1".to_string(),
                name: "orders_enriched".to_string(),
                description: None,
                watermark: None,
                schema,
                schema_v2: None,
            }),
            ..Default::default()
        }
    }

    const PIPELINE_SQL: &str = "INSERT INTO orders_enriched SELECT id, amount FROM orders";

    #[tokio::test]
    async fn test_crud_unchanged() {
        let mut fake = remote(PIPELINE_SQL, fields(&[("id", "INT"), ("amount", "DECIMAL(10, 2)")]));
        fake.output_schema = fields(&[("id", "INT"), ("amount", "NUMERIC(10, 2)")]);

        let detector = CrudChangeDetector::new(&fake);
        assert!(!detector.has_changed(&model()).await.unwrap());
    }

    #[tokio::test]
    async fn test_crud_type_change() {
        let mut fake = remote(PIPELINE_SQL, fields(&[("id", "INT"), ("amount", "DECIMAL(10, 2)")]));
        fake.output_schema = fields(&[("id", "BIGINT"), ("amount", "DECIMAL(10, 2)")]);

        let detection = CrudChangeDetector::new(&fake).detect(&model()).await.unwrap();
        assert!(detection.changed);
        assert_eq!(detection.reason, "schema differs");
    }

    #[tokio::test]
    async fn test_crud_sql_and_missing_remote() {
        let mut fake = remote("INSERT INTO orders_enriched SELECT 1", fields(&[("id", "INT")]));
        fake.output_schema = fields(&[("id", "INT")]);
        let detection = CrudChangeDetector::new(&fake).detect(&model()).await.unwrap();
        assert_eq!(detection.reason, "pipeline SQL differs");

        let fake = FakeControlPlane {
            output_schema: fields(&[("id", "INT")]),
            ..Default::default()
        };
        let detection = CrudChangeDetector::new(&fake).detect(&model()).await.unwrap();
        assert!(detection.changed);
        assert_eq!(detection.reason, "remote stream or pipeline does not exist");
    }

    #[tokio::test]
    async fn test_crud_legacy_primary_key() {
        let mut fake = remote(PIPELINE_SQL, fields(&[("id", "INT PRIMARY KEY")]));
        fake.output_schema = fields(&[("id", "INT")]);

        let mut m = model();
        m.primary_key = vec!["id".to_string()];
        assert!(!CrudChangeDetector::new(&fake).has_changed(&m).await.unwrap());

        m.primary_key = Vec::new();
        assert!(CrudChangeDetector::new(&fake).has_changed(&m).await.unwrap());
    }

    #[tokio::test]
    async fn test_crud_schema_v2() {
        let mut fake = remote(PIPELINE_SQL, Vec::new());
        if let Some(stream) = fake.stream.as_mut() {
            stream.watermark = Some("ts".to_string());
            stream.schema_v2 = Some(json!({
                "fields": [{"name": "ts", "kind": "physical", "type": "TIMESTAMP(3)"}],
                "watermarks": [{"name": "ts", "expression": "ts"}],
                "constraints": {"primary_key": []}
            }));
        }
        fake.output_schema = fields(&[("ts", "TIMESTAMP(3)")]);

        let mut m = model();
        m.watermark = Some("ts".to_string());
        assert!(!CrudChangeDetector::new(&fake).has_changed(&m).await.unwrap());
    }

    #[tokio::test]
    async fn test_unrecognized_hint_fails() {
        let mut fake = remote(PIPELINE_SQL, fields(&[("id", "INT")]));
        fake.output_schema = fields(&[("id", "INT")]);

        let mut m = model();
        m.columns = vec![ColumnHint::new("id", "string")];
        let err = CrudChangeDetector::new(&fake).detect(&m).await.unwrap_err();
        assert_eq!(err.category(), "SchemaError");
    }

    #[tokio::test]
    async fn test_apply_unchanged() {
        let fake = FakeControlPlane {
            output_schema: fields(&[("id", "INT")]),
            apply_results: serde_json::from_value(json!([
                {"result": "unchanged", "kind": "stream"},
                {"result": "unchanged", "kind": "pipeline"}
            ]))
            .unwrap(),
            ..Default::default()
        };

        let detector = ApplyChangeDetector::new(&fake);
        assert!(!detector.has_changed(&model()).await.unwrap());

        let applied = fake.applied.lock().unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1]["spec"]["sql"], PIPELINE_SQL);
    }

    #[tokio::test]
    async fn test_apply_updated() {
        let fake = FakeControlPlane {
            output_schema: fields(&[("id", "INT")]),
            apply_results: serde_json::from_value(json!([
                {"result": "unchanged", "kind": "stream", "name": "orders_enriched"},
                {"result": "updated", "kind": "pipeline", "name": "orders_enriched"}
            ]))
            .unwrap(),
            ..Default::default()
        };

        let detection = ApplyChangeDetector::new(&fake).detect(&model()).await.unwrap();
        assert!(detection.changed);
        assert_eq!(detection.reason, "pipeline 'orders_enriched' would be updated");
    }

    #[tokio::test]
    async fn test_strategy_selection() {
        let fake = FakeControlPlane {
            output_schema: fields(&[("id", "INT")]),
            apply_results: serde_json::from_value(json!([{"result": "created"}])).unwrap(),
            ..Default::default()
        };

        let v1 = DetectionStrategy::for_schema_version(SchemaVersion::V1);
        let v2 = DetectionStrategy::for_schema_version(SchemaVersion::V2);
        assert_eq!(v1, DetectionStrategy::Crud);
        assert_eq!(v2.detector(&fake).strategy(), DetectionStrategy::Apply);

        // 원격 리소스가 없으면 두 전략 모두 변경으로 판단
        assert!(v1.detector(&fake).has_changed(&model()).await.unwrap());
        assert!(v2.detector(&fake).has_changed(&model()).await.unwrap());
    }
}
