//! SQL 미리보기 폴링
//!
//! # 흐름
//!
//! 1. 컨트롤 플레인에서 입력 스트림과 미리보기 토큰을 받습니다.
//! 2. 데이터 플레인에서 미리보기를 시작합니다.
//! 3. 이어받기 토큰이 없어지거나 시간 예산이 다할 때까지 결과를 폴링합니다.
//!    폴링 간격은 1초에서 시작해 두 배씩 늘어나며, 0~1000ms 지터가 붙습니다.
//!
//! append 스트림은 결과를 누적하고, change 스트림은 마지막 변경의 `after`만 유지합니다.
//! 결과가 비면 테스트 판정용 가짜 행 하나를 반환합니다.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::ControlPlane;
use crate::config::StartPosition;
use crate::data_plane::DataPlaneClient;
use crate::error::Result;
use crate::responses::PreviewResponse;

/// 첫 폴링 간격
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// 최대 지터 (포함)
pub const MAX_JITTER_MS: u64 = 1000;

/// 남은 예산이 이보다 작으면 중단 (초)
const EPSILON_SECS: f64 = 0.001;

// ─────────────────────────────────────────────────────────────────────────────
// Backoff
// ─────────────────────────────────────────────────────────────────────────────

/// 지수 백오프 대기 시간 생성기
///
/// 각 대기 시간은 남은 예산을 넘지 않으며, 예산이 소진되면 끝납니다.
pub struct Backoff<J> {
    budget: Duration,
    elapsed: Duration,
    delay: Duration,
    jitter: J,
}

impl Backoff<fn() -> Duration> {
    pub fn new(budget: Duration) -> Self {
        Backoff::with_jitter(budget, random_jitter as fn() -> Duration)
    }
}

impl<J: FnMut() -> Duration> Backoff<J> {
    pub fn with_jitter(budget: Duration, jitter: J) -> Self {
        Self {
            budget,
            elapsed: Duration::ZERO,
            delay: BASE_DELAY,
            jitter,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<J: FnMut() -> Duration> Iterator for Backoff<J> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let remaining = self.budget.saturating_sub(self.elapsed);
        if remaining.as_secs_f64() < EPSILON_SECS {
            return None;
        }

        let wait = self.delay.saturating_add((self.jitter)()).min(remaining);
        self.elapsed += wait;
        self.delay = self.delay.saturating_mul(2);
        Some(wait)
    }
}

fn random_jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS))
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// 결과가 없을 때 사용하는 테스트 판정 행
pub fn fake_test_result() -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("failures".to_string(), Value::from(0));
    row.insert("should_warn".to_string(), Value::from(false));
    row.insert("should_error".to_string(), Value::from(false));
    row
}

/// 미리보기 결과 누적기
#[derive(Debug, Default)]
pub struct ResultCollector {
    append: bool,
    rows: Vec<Map<String, Value>>,
}

impl ResultCollector {
    pub fn new(append: bool) -> Self {
        Self {
            append,
            rows: Vec::new(),
        }
    }

    pub fn absorb(&mut self, response: &PreviewResponse) {
        if self.append {
            self.rows.extend(response.results.iter().cloned());
            return;
        }

        // change stream: 마지막 변경의 after 이미지만 유지 (삭제면 비움)
        if let Some(last_change) = response.results.last() {
            self.rows = match last_change.get("after") {
                Some(Value::Object(after)) if !after.is_empty() => vec![after.clone()],
                _ => Vec::new(),
            };
        }
    }

    /// 최종 결과 (비었으면 가짜 행)
    pub fn finish(self) -> Vec<Map<String, Value>> {
        if self.rows.is_empty() {
            vec![fake_test_result()]
        } else {
            self.rows
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Polling
// ─────────────────────────────────────────────────────────────────────────────

/// 이어받기 토큰으로 다음 결과를 가져오는 쪽
#[async_trait]
pub trait PreviewPoller: Send + Sync {
    async fn poll(&self, next_token: &str) -> Result<PreviewResponse>;
}

/// 데이터 플레인 폴러
pub struct DataPlanePoller<'a> {
    client: &'a DataPlaneClient,
    token: String,
}

impl<'a> DataPlanePoller<'a> {
    pub fn new(client: &'a DataPlaneClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl PreviewPoller for DataPlanePoller<'_> {
    async fn poll(&self, next_token: &str) -> Result<PreviewResponse> {
        self.client.get_preview(&self.token, next_token).await
    }
}

/// 이어받기 토큰이 없어지거나 대기 시간이 소진될 때까지 폴링
///
/// 시작 응답의 결과는 사용하지 않고 토큰만 사용합니다.
pub async fn collect_results<P, D>(poller: &P, first: PreviewResponse, delays: D) -> Result<Vec<Map<String, Value>>>
where
    P: PreviewPoller + ?Sized,
    D: IntoIterator<Item = Duration>,
{
    let mut collector = ResultCollector::new(first.is_append());
    let mut delays = delays.into_iter();
    let mut next_token = first.next_token;
    let mut polls = 0usize;

    while let Some(token) = next_token {
        let response = poller.poll(&token).await?;
        polls += 1;
        debug!(id = %response.id, results = response.results.len(), "preview poll");
        collector.absorb(&response);

        next_token = response.next_token;
        if next_token.is_none() {
            break;
        }
        match delays.next() {
            Some(wait) => tokio::time::sleep(wait).await,
            None => {
                info!(polls, "preview time budget exhausted");
                break;
            }
        }
    }

    Ok(collector.finish())
}

/// SQL 미리보기 실행
pub async fn run_preview<C>(
    control: &C,
    sql: &str,
    start: StartPosition,
    budget: Duration,
    request_timeout: Duration,
) -> Result<Vec<Map<String, Value>>>
where
    C: ControlPlane + ?Sized,
{
    let dependencies = control.get_preview_dependencies(sql).await?;
    let input_streams: Vec<String> = dependencies
        .inputs
        .into_iter()
        .map(|input| input.resource_name)
        .collect();
    debug!(?input_streams, start = start.as_str(), "preview inputs resolved");

    let tokens = control.get_preview_tokens(sql, start, &input_streams).await?;
    let account = control.get_account_info().await?;
    let data_plane = DataPlaneClient::for_hostname(&account.data_plane_hostname, request_timeout)?;

    let first = data_plane
        .start_preview(&tokens.post_token, &tokens.data_plane_request)
        .await?;
    info!(id = %first.id, stream_type = %first.output_stream_type, "preview started");

    let poller = DataPlanePoller::new(&data_plane, tokens.get_token);
    collect_results(&poller, first, Backoff::new(budget)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::ApiError;

    /// 미리 정해둔 응답을 차례로 돌려주는 폴러
    struct ScriptedPoller {
        responses: Mutex<Vec<PreviewResponse>>,
    }

    impl ScriptedPoller {
        fn new(mut responses: Vec<PreviewResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }

        fn remaining(&self) -> usize {
            self.responses.lock().map(|r| r.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl PreviewPoller for ScriptedPoller {
        async fn poll(&self, _next_token: &str) -> Result<PreviewResponse> {
            let next = self.responses.lock().ok().and_then(|mut r| r.pop());
            next.ok_or_else(|| ApiError::InvalidResponse("no scripted preview response left".to_string()))
        }
    }

    fn response(kind: &str, results: Value, next_token: Option<&str>) -> PreviewResponse {
        serde_json::from_value(json!({
            "id": "p1",
            "output_stream_type": kind,
            "results": results,
            "next_token": next_token,
        }))
        .unwrap()
    }

    fn no_wait(n: usize) -> impl Iterator<Item = Duration> {
        std::iter::repeat(Duration::ZERO).take(n)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let waits: Vec<Duration> =
            Backoff::with_jitter(Duration::from_secs(10), || Duration::ZERO).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(3),
            ]
        );
    }

    #[test]
    fn test_backoff_adds_jitter() {
        let mut backoff = Backoff::with_jitter(Duration::from_secs(60), || Duration::from_millis(250));
        assert_eq!(backoff.next(), Some(Duration::from_millis(1250)));
        assert_eq!(backoff.next(), Some(Duration::from_millis(2250)));
        assert_eq!(backoff.elapsed(), Duration::from_millis(3500));
    }

    #[test]
    fn test_backoff_respects_epsilon() {
        assert_eq!(Backoff::with_jitter(Duration::ZERO, || Duration::ZERO).count(), 0);
        assert_eq!(
            Backoff::with_jitter(Duration::from_micros(500), || Duration::ZERO).count(),
            0
        );
        let waits: Vec<Duration> = Backoff::new(Duration::from_millis(1500)).collect();
        assert!(!waits.is_empty());
        assert_eq!(waits.iter().sum::<Duration>(), Duration::from_millis(1500));
    }

    #[test]
    fn test_random_jitter_range() {
        for _ in 0..100 {
            assert!(random_jitter() <= Duration::from_millis(MAX_JITTER_MS));
        }
    }

    #[tokio::test]
    async fn test_append_stream_accumulates() {
        let poller = ScriptedPoller::new(vec![
            response("APPEND", json!([{"a": 1}]), Some("t2")),
            response("APPEND", json!([{"a": 2}, {"a": 3}]), None),
        ]);
        let first = response("APPEND", json!([{"ignored": true}]), Some("t1"));

        let rows = collect_results(&poller, first, no_wait(10)).await.unwrap();
        let values: Vec<i64> = rows.iter().map(|r| r["a"].as_i64().unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(poller.remaining(), 0);
    }

    #[tokio::test]
    async fn test_change_stream_keeps_last_after() {
        let poller = ScriptedPoller::new(vec![
            response("CHANGE", json!([{"after": {"n": 1}}, {"after": {"n": 2}}]), Some("t2")),
            response("CHANGE", json!([]), Some("t3")),
            response("CHANGE", json!([{"before": {"n": 2}, "after": {"n": 5}}]), None),
        ]);
        let first = response("CHANGE", json!([]), Some("t1"));

        let rows = collect_results(&poller, first, no_wait(10)).await.unwrap();
        assert_eq!(rows, vec![json!({"n": 5}).as_object().cloned().unwrap()]);
    }

    #[tokio::test]
    async fn test_change_stream_delete_yields_fake_row() {
        let poller = ScriptedPoller::new(vec![response(
            "CHANGE",
            json!([{"after": {"n": 1}}, {"before": {"n": 1}, "after": null}]),
            None,
        )]);
        let first = response("CHANGE", json!([]), Some("t1"));

        let rows = collect_results(&poller, first, no_wait(10)).await.unwrap();
        assert_eq!(rows, vec![fake_test_result()]);
    }

    #[tokio::test]
    async fn test_stops_when_budget_exhausted() {
        let poller = ScriptedPoller::new(vec![
            response("APPEND", json!([{"a": 1}]), Some("t2")),
            response("APPEND", json!([{"a": 2}]), Some("t3")),
            response("APPEND", json!([{"a": 3}]), Some("t4")),
        ]);
        let first = response("APPEND", json!([]), Some("t1"));

        let rows = collect_results(&poller, first, no_wait(1)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(poller.remaining(), 1);
    }

    #[tokio::test]
    async fn test_no_token_means_no_polling() {
        let poller = ScriptedPoller::new(Vec::new());
        let first = response("APPEND", json!([]), None);

        let rows = collect_results(&poller, first, no_wait(10)).await.unwrap();
        assert_eq!(rows, vec![fake_test_result()]);
    }
}
