//! 데이터 플레인 클라이언트
//!
//! 미리보기 실행과 스트림 비우기를 담당합니다. 인증은 컨트롤 플레인이
//! 발급한 일회용 토큰을 사용합니다.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::api::{send_empty, send_json};
use crate::error::Result;
use crate::responses::PreviewResponse;

/// 미리보기 이어받기 토큰 헤더
const CONTINUATION_HEADER: &str = "decodable-token";

#[derive(Debug, Clone)]
pub struct DataPlaneClient {
    base_url: String,
    http: Client,
}

impl DataPlaneClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    /// 계정 정보의 `data_plane_hostname`으로 생성
    pub fn for_hostname(hostname: &str, timeout: Duration) -> Result<Self> {
        Self::new(format!("https://{}", hostname), timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 미리보기 시작
    ///
    /// `data_plane_request`는 컨트롤 플레인이 만든 요청 본문 그대로입니다.
    pub async fn start_preview(&self, token: &str, data_plane_request: &str) -> Result<PreviewResponse> {
        debug!(base_url = %self.base_url, "starting preview");
        let req = self
            .http
            .post(format!("{}/sql/preview", self.base_url))
            .bearer_auth(token)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .body(data_plane_request.to_string());
        send_json(req).await
    }

    /// 다음 미리보기 결과
    pub async fn get_preview(&self, token: &str, next_token: &str) -> Result<PreviewResponse> {
        let req = self
            .http
            .get(format!("{}/sql/preview", self.base_url))
            .bearer_auth(token)
            .header("accept", "application/json")
            .header(CONTINUATION_HEADER, next_token);
        send_json(req).await
    }

    pub async fn clear_stream(&self, stream_id: &str, token: &str) -> Result<()> {
        debug!(stream_id, "clearing stream");
        let req = self
            .http
            .post(format!("{}/streams/{}/clear", self.base_url, stream_id))
            .bearer_auth(token)
            .header("accept", "application/json");
        send_empty(req).await
    }
}
