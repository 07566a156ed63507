//! 환율 수집 스케줄러.
//!
//! 고정 주기마다 [`run_cycle`]을 실행합니다. 한 번에 하나의 주기만 진행되며,
//! 주기가 길어지면 다음 틱이 뒤로 밀립니다 (`MissedTickBehavior::Delay`).
//!
//! 종료는 두 단계입니다:
//! - `shutdown` 토큰: 새 주기를 시작하지 않음. 진행 중인 주기는 끝까지 실행
//! - `force` 토큰: 진행 중인 공급자 요청까지 중단

use std::sync::Arc;
use std::time::Duration;

use currency_data::{RateProvider, RateStore};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::CollectorError;
use crate::modules::rate_collect::run_cycle;
use crate::{CollectionStats, Result};

/// 스케줄러 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 다음 틱 대기
    Idle,
    /// 수집 주기 진행 중
    Fetching,
    /// 종료됨
    Terminated,
}

/// 환율 수집 스케줄러
pub struct RateScheduler {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn RateStore>,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl RateScheduler {
    /// 스케줄러 생성.
    ///
    /// 주기가 0이면 설정 에러입니다.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(CollectorError::Config(
                "수집 주기는 0보다 커야 합니다".to_string(),
            ));
        }

        let (state, _) = watch::channel(SchedulerState::Idle);
        Ok(Self {
            provider,
            store,
            interval,
            state,
        })
    }

    /// 현재 상태
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// 상태 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 종료될 때까지 주기적으로 수집합니다.
    ///
    /// 첫 수집은 한 주기가 지난 뒤 시작합니다.
    pub async fn run(&self, shutdown: CancellationToken, force: CancellationToken) -> CollectionStats {
        tracing::info!(
            interval = ?self.interval,
            url = %self.provider.url(),
            timeout = ?self.provider.timeout(),
            "환율 수집 스케줄러 시작"
        );

        let mut stats = CollectionStats::new();
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if shutdown.is_cancelled() {
                        break;
                    }

                    self.state.send_replace(SchedulerState::Fetching);
                    let report = run_cycle(
                        self.provider.as_ref(),
                        self.store.as_ref(),
                        force.child_token(),
                    )
                    .await;
                    stats.record(&report);
                    self.state.send_replace(SchedulerState::Idle);
                }
            }
        }

        self.state.send_replace(SchedulerState::Terminated);
        stats.log_summary("환율 수집 스케줄러");
        tracing::info!("환율 수집 스케줄러 종료");
        stats
    }
}
