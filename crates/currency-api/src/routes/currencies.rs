//! 통화별 환율 이력 endpoint.
//!
//! `GET /currencies/{currency}?finit=...&fend=...`
//!
//! - `currency`: 영문 3자리 통화 코드 또는 `all` (대문자로 정규화)
//! - `finit`/`fend`: `YYYY-MM-DDTHH:MM:SS` (UTC). 비어 있으면 저장된 최소/최대 시각

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use currency_data::{CurrencyFilter, RateValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{bad_request, internal_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 쿼리 파라미터 날짜 형식
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const CURRENCY_PARAM: &str = "currency";

/// 범위 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub finit: Option<String>,
    pub fend: Option<String>,
}

// ==================== 검증 ====================

/// 경로 파라미터를 검증하고 대문자 필터로 변환합니다.
pub fn parse_currency(value: &str) -> Result<CurrencyFilter, ApiErrorResponse> {
    if value.is_empty() {
        return Err(ApiErrorResponse::new(
            "EMPTY_CURRENCY",
            format!("the route parameter is empty ({CURRENCY_PARAM})"),
        ));
    }

    if value.chars().count() != 3 {
        return Err(ApiErrorResponse::new(
            "INVALID_CURRENCY",
            format!(
                "bad route parameter ({CURRENCY_PARAM}) with value ({value}). it must contain only 3 letters"
            ),
        ));
    }

    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiErrorResponse::new(
            "INVALID_CURRENCY",
            format!(
                "bad route parameter ({CURRENCY_PARAM}) with value ({value}). it must contain only letters"
            ),
        ));
    }

    Ok(CurrencyFilter::from_value(&value.to_ascii_uppercase()))
}

/// 날짜 쿼리 파라미터 파싱. 없거나 비어 있으면 `None`.
pub fn parse_datetime_param(
    name: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ApiErrorResponse> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| {
                ApiErrorResponse::with_details(
                    "INVALID_DATETIME",
                    format!("bad query parameter {name} with value {raw}"),
                    json!({ "parameter": name, "format": DATETIME_FORMAT }),
                )
            }),
    }
}

// ==================== 핸들러 ====================

/// 통화 환율 이력 조회.
///
/// GET /currencies/{currency}
pub async fn list_currency_rates(
    State(state): State<Arc<AppState>>,
    Path(currency): Path<String>,
    Query(range): Query<RangeQuery>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Vec<RateValue>>> {
    let parsed = parse_currency(&currency).and_then(|filter| {
        let start = parse_datetime_param("finit", range.finit.as_deref())?;
        let end = parse_datetime_param("fend", range.fend.as_deref())?;
        Ok((filter, start, end))
    });
    let (filter, start, end) =
        parsed.map_err(|e| bad_request(e.with_request_info(&method, &uri)))?;

    let rates = state.query.list(&filter, start, end).await.map_err(|e| {
        error!(%filter, error = %e, "환율 조회 실패");
        internal_error(ApiErrorResponse::from(e).with_request_info(&method, &uri))
    })?;

    debug!(%filter, count = rates.len(), "환율 조회 완료");
    Ok(Json(rates))
}

/// 통화 파라미터 없이 들어온 요청.
///
/// GET /currencies
pub async fn missing_currency(
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Vec<RateValue>>> {
    Err(bad_request(
        ApiErrorResponse::new(
            "EMPTY_CURRENCY",
            format!("the route parameter is empty ({CURRENCY_PARAM})"),
        )
        .with_request_info(&method, &uri),
    ))
}

/// 환율 라우터 생성.
pub fn currencies_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(missing_currency))
        .route("/{currency}", get(list_currency_rates))
}
