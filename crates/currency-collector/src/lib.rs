//! 환율 수집기.
//!
//! 이 crate는 다음을 제공합니다:
//! - 환경변수 설정 로드 (공급자, 수집 주기, 데이터베이스)
//! - 공급자 응답 해석 및 1회 수집 주기 실행
//! - 고정 주기 스케줄러 (2단계 종료)
//! - 독립 실행 CLI (`currency-collector`)

pub mod config;
pub mod error;
pub mod modules;
pub mod scheduler;
pub mod shutdown;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CollectorConfig, ScheduleConfig};
pub use error::{CollectorError, Result};
pub use scheduler::{RateScheduler, SchedulerState};
pub use stats::CollectionStats;

/// 로깅 초기화.
///
/// `LOG_FORMAT=json`이면 JSON 포맷, 그 외에는 기본 포맷을 사용합니다.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
