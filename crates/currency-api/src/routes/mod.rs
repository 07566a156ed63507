//! API 라우트.

pub mod currencies;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub use currencies::currencies_router;
pub use health::{health_router, HealthResponse};

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/currencies", currencies_router())
}
