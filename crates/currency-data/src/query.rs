//! 날짜 범위 조회.
//!
//! 범위의 한쪽이 지정되지 않으면 저장된 전역 최소/최대 시각으로 대체합니다.
//! "지정되지 않음"은 `None` 또는 UNIX epoch(0 시각)입니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::model::{CurrencyFilter, RateValue};
use crate::storage::RateStore;

/// 지정되지 않은 경계인지 확인
pub fn is_unset(bound: Option<DateTime<Utc>>) -> bool {
    match bound {
        None => true,
        Some(ts) => ts == DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// 전역 최소/최대 조회가 필요한지 확인
pub fn needs_global_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    is_unset(start) || is_unset(end)
}

/// 조회 범위 확정.
///
/// 지정되지 않은 경계는 `bounds`의 최소/최대로 대체합니다.
/// 대체가 필요한데 `bounds`가 없으면(빈 저장소) `None`을 반환합니다.
pub fn resolve_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match start.filter(|_| !is_unset(start)) {
        Some(ts) => ts,
        None => bounds?.0,
    };
    let end = match end.filter(|_| !is_unset(end)) {
        Some(ts) => ts,
        None => bounds?.1,
    };

    Some((start, end))
}

/// 환율 조회 서비스.
#[derive(Clone)]
pub struct RateQueryService {
    store: Arc<dyn RateStore>,
}

impl RateQueryService {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    /// 통화 필터와 선택적 범위로 환율 값을 조회합니다.
    pub async fn list(
        &self,
        filter: &CurrencyFilter,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<RateValue>> {
        let rates = self.store.list_rate_values_by_range(filter, start, end).await?;
        debug!(%filter, ?start, ?end, count = rates.len(), "Rate range query");
        Ok(rates)
    }

    /// 저장소 연결 상태 확인
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}
