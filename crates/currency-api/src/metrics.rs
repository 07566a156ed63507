//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭을 수집하고 수집기 메트릭과 함께 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const HTTP_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

// 공급자 요청은 초 단위 타임아웃을 가지므로 더 넓게 잡습니다.
const FETCH_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// 히스토그램 버킷이 설정된 빌더.
pub fn metrics_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            HTTP_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("rate_fetch_duration_seconds".to_string()),
            FETCH_BUCKETS,
        )
}

/// Prometheus 메트릭 레코더를 전역으로 설치하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    metrics_builder()?.install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 라우터가 매칭하지 못한 경로의 라벨 카디널리티를 제한합니다.
///
/// 예: `/currencies/usd` → `/currencies/{currency}`, `/foo/42` → `/foo/{id}`
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    path.split('/')
        .map(|segment| {
            let normalized = if previous == "currencies" && !segment.is_empty() {
                "{currency}"
            } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            };
            previous = segment;
            normalized
        })
        .collect::<Vec<_>>()
        .join("/")
}
