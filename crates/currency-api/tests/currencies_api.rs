//! 라우터 전체(정규화 + 미들웨어)를 인메모리 저장소로 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use currency_api::{create_app, AppState};
use currency_data::memory::MemoryRateStore;
use currency_data::{FetchStatus, NewFetchAudit, RateStore, RateValue};

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// USD(1월 1일), EUR(1월 5일)이 저장된 저장소
async fn seeded_store() -> Arc<MemoryRateStore> {
    let store = Arc::new(MemoryRateStore::new());
    let mut request_ids = Vec::new();
    for _ in 0..2 {
        let id = store
            .insert_fetch_audit(&NewFetchAudit {
                url: "http://provider/v3/latest".to_string(),
                elapsed: Duration::from_millis(120),
                status: FetchStatus::Success,
                requested_at: Utc::now(),
            })
            .await
            .unwrap();
        request_ids.push(id);
    }

    store
        .bulk_insert_rate_values(&[
            RateValue {
                name: "USD".to_string(),
                request_id: request_ids[0],
                value: dec!(1),
                last_updated_at: ts(2024, 1, 1),
            },
            RateValue {
                name: "EUR".to_string(),
                request_id: request_ids[1],
                value: dec!(0.913),
                last_updated_at: ts(2024, 1, 5),
            },
        ])
        .await
        .unwrap();

    store
}

async fn get(store: Arc<MemoryRateStore>, uri: &str) -> (StatusCode, Value) {
    let app = create_app(Arc::new(AppState::new(store)), None);

    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|rate| rate["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_single_currency_without_range() {
    let (status, body) = get(seeded_store().await, "/currencies/eur").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["EUR"]);
    assert_eq!(body[0]["request_id"], 2);
    assert_eq!(body[0]["value"].as_f64(), Some(0.913));
    assert_eq!(body[0]["last_updated_at"], "2024-01-05T00:00:00Z");
}

#[tokio::test]
async fn test_all_currencies_ordered_by_time() {
    let (status, body) = get(seeded_store().await, "/currencies/all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["USD", "EUR"]);
}

#[tokio::test]
async fn test_partial_range_uses_stored_bounds() {
    let (status, body) = get(
        seeded_store().await,
        "/currencies/ALL?finit=2024-01-02T00:00:00",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["EUR"]);

    let (_, body) = get(
        seeded_store().await,
        "/currencies/all?finit=&fend=2024-01-01T00:00:00",
    )
    .await;
    assert_eq!(names(&body), vec!["USD"]);
}

#[tokio::test]
async fn test_inverted_range_is_empty() {
    let (status, body) = get(
        seeded_store().await,
        "/currencies/all?finit=2024-01-05T00:00:00&fend=2024-01-01T00:00:00",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_empty_store_returns_empty_array() {
    let (status, body) = get(Arc::new(MemoryRateStore::new()), "/currencies/usd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let (status, body) = get(seeded_store().await, "/currencies/usd/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["USD"]);
}

#[tokio::test]
async fn test_invalid_currency_is_bad_request() {
    let (status, body) = get(seeded_store().await, "/currencies/US").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CURRENCY");
    assert_eq!(
        body["message"],
        "bad route parameter (currency) with value (US). it must contain only 3 letters"
    );
    assert_eq!(body["path"], "/currencies/US");

    let (status, _) = get(seeded_store().await, "/currencies/u5d").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_currency_is_bad_request() {
    for uri in ["/currencies", "/currencies/"] {
        let (status, body) = get(seeded_store().await, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "the route parameter is empty (currency)");
        assert_eq!(body["path"], "/currencies");
    }
}

#[tokio::test]
async fn test_invalid_datetime_is_bad_request() {
    let (status, body) = get(seeded_store().await, "/currencies/usd?finit=2024-01-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DATETIME");
    assert_eq!(body["message"], "bad query parameter finit with value 2024-01-01");
    assert_eq!(body["details"]["parameter"], "finit");
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let store = seeded_store().await;
    store.fail_reads(true);

    let (status, body) = get(store, "/currencies/usd").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DB_ERROR");
    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/currencies/usd");
}

#[tokio::test]
async fn test_health_endpoints() {
    let (status, _) = get(seeded_store().await, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(seeded_store().await, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["database"]["status"], "up");
    assert_eq!(body["components"]["collector"]["status"], "not_configured");
}

#[tokio::test]
async fn test_metrics_endpoint_when_configured() {
    let recorder = currency_api::metrics::metrics_builder()
        .unwrap()
        .build_recorder();
    let app = create_app(
        Arc::new(AppState::new(seeded_store().await)),
        Some(recorder.handle()),
    );

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = get(seeded_store().await, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
