//! 애플리케이션 상태 관리.
//!
//! 모든 API 핸들러에서 공유하는 상태를 정의합니다.

use std::sync::Arc;

use currency_collector::SchedulerState;
use currency_data::{RateQueryService, RateStore};
use tokio::sync::watch;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 날짜 범위 조회 서비스
    pub query: RateQueryService,

    /// 수집 스케줄러 상태 구독 (스케줄러 없이 실행하면 None)
    pub scheduler: Option<watch::Receiver<SchedulerState>>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self {
            query: RateQueryService::new(store),
            scheduler: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 스케줄러 상태 구독 설정.
    pub fn with_scheduler(mut self, states: watch::Receiver<SchedulerState>) -> Self {
        self.scheduler = Some(states);
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.query.health_check().await.is_ok()
    }

    /// 현재 스케줄러 상태.
    pub fn scheduler_state(&self) -> Option<SchedulerState> {
        self.scheduler.as_ref().map(|states| *states.borrow())
    }
}

/// 인메모리 저장소 기반 테스트 상태.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(store: Arc<currency_data::memory::MemoryRateStore>) -> AppState {
    AppState::new(store)
}
