//! 변경 감지 (reconciliation)
//!
//! 로컬 모델에서 계산한 스트림과 원격 스트림을 비교하여 재배포가 필요한지
//! 판단합니다. 이 모듈은 순수 함수만 제공하고, 원격 호출은 클라이언트
//! 크레이트의 감지기(`ChangeDetector`)가 담당합니다.
//!
//! # 비교 순서 (명령형 경로)
//!
//! 1. 원격 스트림/파이프라인이 없으면 변경됨
//! 2. 파이프라인 SQL (문자 그대로 비교)
//! 3. 워터마크
//! 4. 스키마 (정규화 타입, 순서 구분)
//!
//! # 선언형 경로
//!
//! 원격 서비스의 dry-run apply 결과 중 하나라도 `unchanged`가 아니면 변경됨입니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::pipeline::pipeline_description;
use crate::schema::{Schema, SchemaField};

// ─────────────────────────────────────────────────────────────────────────────
// Local
// ─────────────────────────────────────────────────────────────────────────────

/// 모델 파일에 선언된 컬럼 타입 힌트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHint {
    pub name: String,

    /// 비어 있으면 힌트로 취급하지 않습니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ColumnHint {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
        }
    }
}

/// 로컬 모델에서 계산한 스트림
#[derive(Debug, Clone)]
pub struct LocalStream {
    /// 파이프라인 SQL (`INSERT INTO ...`)
    pub sql: String,
    pub watermark: Option<String>,
    pub schema: Schema,
    hints: Vec<SchemaField>,
}

impl LocalStream {
    /// 로컬 스트림 계산
    ///
    /// - 힌트는 하나라도 인식 실패하면 즉시 에러를 반환합니다.
    /// - `resolved_fields`는 원격 계획 서비스가 SQL로부터 계산한 필드 목록입니다.
    ///   `PRIMARY KEY` 표시는 제거하고 모델의 primary key로 제약 조건을 설정합니다.
    pub fn derive(
        sql: impl Into<String>,
        watermark: Option<String>,
        primary_key: Vec<String>,
        hints: &[ColumnHint],
        resolved_fields: &[Value],
    ) -> Result<Self> {
        let hints = hints
            .iter()
            .filter_map(|hint| {
                hint.data_type
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .map(|t| SchemaField::physical(hint.name.as_str(), t))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut schema =
            Schema::from_json_components(resolved_fields, &[], Vec::new())?.without_primary_key_markers();
        schema.constraints.primary_key = primary_key;

        Ok(Self {
            sql: sql.into(),
            watermark,
            schema,
            hints,
        })
    }

    /// 파싱된 힌트
    pub fn hints(&self) -> &[SchemaField] {
        &self.hints
    }

    /// 계산된 스키마에 없는 힌트
    ///
    /// 에러가 아니라 경고 대상입니다.
    pub fn hint_mismatches(&self) -> Vec<&SchemaField> {
        self.hints
            .iter()
            .filter(|hint| !self.schema.fields.contains(*hint))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote
// ─────────────────────────────────────────────────────────────────────────────

/// 원격 스트림과 그 스트림을 채우는 파이프라인
#[derive(Debug, Clone)]
pub struct RemoteStream {
    /// 파이프라인 SQL
    pub sql: String,
    pub watermark: Option<String>,
    pub schema: Schema,
}

/// 변경 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    MissingRemote,
    Sql,
    Watermark,
    Schema,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ChangeReason::MissingRemote => "remote stream or pipeline does not exist",
            ChangeReason::Sql => "pipeline SQL differs",
            ChangeReason::Watermark => "watermark differs",
            ChangeReason::Schema => "schema differs",
        };
        f.write_str(text)
    }
}

/// 첫 번째 변경 사유 (변경 없으면 `None`)
pub fn change_reason(local: &LocalStream, remote: Option<&RemoteStream>) -> Option<ChangeReason> {
    let Some(remote) = remote else {
        return Some(ChangeReason::MissingRemote);
    };

    if local.sql != remote.sql {
        return Some(ChangeReason::Sql);
    }
    if local.watermark != remote.watermark {
        return Some(ChangeReason::Watermark);
    }
    if local.schema != remote.schema {
        return Some(ChangeReason::Schema);
    }
    None
}

pub fn stream_has_changed(local: &LocalStream, remote: Option<&RemoteStream>) -> bool {
    change_reason(local, remote).is_some()
}

// ─────────────────────────────────────────────────────────────────────────────
// Declarative (apply)
// ─────────────────────────────────────────────────────────────────────────────

/// 리소스별 dry-run apply 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Unchanged,
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub result: ApplyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ApplyOutcome {
    pub fn is_changed(&self) -> bool {
        self.result != ApplyStatus::Unchanged
    }
}

pub fn any_resource_changed(outcomes: &[ApplyOutcome]) -> bool {
    outcomes.iter().any(ApplyOutcome::is_changed)
}

/// dry-run apply에 보낼 리소스 문서 (스트림 + 파이프라인)
pub fn declarative_resources(name: &str, local: &LocalStream) -> Vec<Value> {
    let mut stream_spec = json!({ "schema_v2": local.schema.to_dict() });
    if let Some(watermark) = &local.watermark {
        stream_spec["watermark"] = Value::from(watermark.as_str());
    }

    vec![
        json!({
            "kind": "stream",
            "metadata": { "name": name },
            "spec_version": "v1",
            "spec": stream_spec,
        }),
        json!({
            "kind": "pipeline",
            "metadata": { "name": name, "description": pipeline_description(name) },
            "spec_version": "v1",
            "spec": { "type": "SQL", "sql": local.sql },
        }),
    ]
}
