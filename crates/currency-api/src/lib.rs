//! 환율 이력 REST API.
//!
//! 이 crate는 다음을 제공합니다:
//! - `GET /currencies/{currency}` 날짜 범위 조회
//! - 헬스 체크 (`/health`, `/health/ready`)
//! - Prometheus 메트릭 (`/metrics`)
//! - 서버 설정 및 라우터 조립

pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiErrorResponse, ApiResult};
pub use server::{create_app, create_router, ServerConfig};
pub use state::AppState;
