//! API 응답 형태

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 목록 응답
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T = Value> {
    #[serde(default)]
    pub items: Vec<T>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// 스트림 상세
///
/// `schema_v2`가 있으면 그것을, 없으면 구형 `schema` 필드 목록을 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub watermark: Option<String>,

    #[serde(default)]
    pub schema: Vec<Value>,

    #[serde(default)]
    pub schema_v2: Option<Value>,
}

/// 파이프라인 상세
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub id: String,
    pub name: String,
    pub sql: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub actual_state: Option<String>,

    #[serde(default)]
    pub target_state: Option<String>,
}

/// 목록 항목 (이름/ID만 사용)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: String,
    pub name: String,
}

/// 파이프라인의 입출력 스트림
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedStream {
    pub stream_id: String,

    #[serde(default)]
    pub is_source: bool,
}

/// 생성 응답 (ID만 사용)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEventsResponse {
    pub count: u64,
}

/// SQL로부터 계산된 출력 스키마
#[derive(Debug, Clone, Deserialize)]
pub struct OutputStreamResponse {
    #[serde(default)]
    pub schema: Vec<Value>,
}

/// 미리보기 결과 조각
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewResponse {
    pub id: String,
    pub output_stream_type: String,

    #[serde(default)]
    pub results: Vec<Map<String, Value>>,

    #[serde(default)]
    pub next_token: Option<String>,
}

impl PreviewResponse {
    /// 추가 전용 스트림인지 (아니면 change stream)
    pub fn is_append(&self) -> bool {
        self.output_stream_type == "APPEND"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewTokensResponse {
    pub data_plane_request: String,
    pub post_token: String,
    pub get_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPlaneTokenResponse {
    #[serde(default)]
    pub data_plane_request: Option<String>,
    pub token: String,
}

/// 미리보기 입력 스트림
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewDependencies {
    #[serde(default)]
    pub inputs: Vec<PreviewInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewInput {
    #[serde(rename = "resourceName")]
    pub resource_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub data_plane_hostname: String,

    #[serde(default)]
    pub deployment_type: Option<String>,
}
