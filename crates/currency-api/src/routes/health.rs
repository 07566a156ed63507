//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use currency_collector::SchedulerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded" | "unhealthy")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 저장소 연결 상태
    pub database: ComponentStatus,

    /// 환율 수집 스케줄러 상태
    pub collector: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down" | "not_configured")
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up() -> Self {
        Self {
            status: "up".to_string(),
            message: None,
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            message: None,
        }
    }

    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 저장소 연결과 스케줄러 상태를 확인합니다. 저장소가 응답하지 않으면 503.
/// GET /health/ready
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut overall_status = "healthy";
    let mut status_code = StatusCode::OK;

    let database_status = if state.is_store_healthy().await {
        ComponentStatus::up()
    } else {
        overall_status = "unhealthy";
        status_code = StatusCode::SERVICE_UNAVAILABLE;
        ComponentStatus::down("연결 실패")
    };

    // 스케줄러 종료는 조회에 영향이 없으므로 degraded로 처리
    let collector_status = match state.scheduler_state() {
        None => ComponentStatus::not_configured(),
        Some(SchedulerState::Idle) => ComponentStatus::up_with_info("idle"),
        Some(SchedulerState::Fetching) => ComponentStatus::up_with_info("fetching"),
        Some(SchedulerState::Terminated) => {
            if overall_status == "healthy" {
                overall_status = "degraded";
            }
            ComponentStatus::down("terminated")
        }
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            database: database_status,
            collector: collector_status,
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
