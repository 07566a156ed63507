//! HTTP 요청 metrics middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// 라벨 경로는 라우트 템플릿(`/currencies/{currency}`)을 우선 사용하고,
/// 매칭되지 않은 요청은 [`normalize_path`]로 정규화합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    };

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}
