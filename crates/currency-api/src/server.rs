//! 서버 설정 및 라우터 조립.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, middleware, routing::get, Router};
use currency_collector::CollectorError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer, normalize_path::NormalizePath,
    normalize_path::NormalizePathLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::middleware::metrics_layer;
use crate::routes::create_api_router;
use crate::state::AppState;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9000;

/// 요청 처리 타임아웃 (초과 시 408)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 서버 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드 (`API_HOST`, `SERVER_PORT`).
    pub fn from_env() -> Result<Self, CollectorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 조회 함수에서 설정 로드. 빈 값은 미설정으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CollectorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("SERVER_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                CollectorError::Config(format!("SERVER_PORT='{raw}' 형식 오류"))
            })?,
        };

        Ok(Self { host, port })
    }

    /// 소켓 주소 반환.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
///
/// 메트릭 핸들이 없으면 `/metrics`를 노출하지 않습니다.
pub fn create_router(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut router = create_api_router().with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    router
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(CatchPanicLayer::new())
}

/// 후행 슬래시를 제거한 뒤 라우팅하는 서비스.
///
/// 정규화는 라우팅 전에 일어나야 하므로 `Router` 바깥을 감쌉니다.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state, metrics_handle))
}
