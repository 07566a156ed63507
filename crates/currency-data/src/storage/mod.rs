//! 저장소 모듈.
//!
//! - [`Database`]: 연결 풀 소유 및 재연결
//! - [`RateRepository`]: 요청 감사 로그 + 환율 값 저장/조회 (PostgreSQL)
//! - [`RateStore`]: 수집기와 조회 서비스가 의존하는 저장소 trait

pub mod database;
pub mod rate_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{CurrencyFilter, NewFetchAudit, RateValue};
use crate::query::{needs_global_bounds, resolve_range};

pub use database::{Database, DatabaseConfig};
pub use rate_repository::RateRepository;

/// 환율 저장소 trait.
///
/// 모든 쓰기는 원자적입니다. 실패 시 부분 결과가 남지 않습니다.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// 요청 감사 레코드를 저장하고 부여된 ID를 반환합니다.
    async fn insert_fetch_audit(&self, record: &NewFetchAudit) -> Result<i64>;

    /// 환율 값을 단일 트랜잭션으로 일괄 저장하고 저장된 행 수를 반환합니다.
    ///
    /// 빈 배치는 아무 작업 없이 0을 반환합니다.
    async fn bulk_insert_rate_values(&self, batch: &[RateValue]) -> Result<u64>;

    /// 저장된 `last_updated_at`의 (최소, 최대). 비어 있으면 `None`.
    async fn rate_time_bounds(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>>;

    /// `start..=end` 범위의 환율 값 조회 (양 끝 포함).
    ///
    /// 정렬: `last_updated_at`, `request_id`, `name`.
    async fn list_rate_values_between(
        &self,
        filter: &CurrencyFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RateValue>>;

    /// 저장소 연결 상태 확인
    async fn health_check(&self) -> Result<()>;

    /// 선택적 범위로 환율 값 조회.
    ///
    /// 범위 한쪽이라도 지정되지 않으면(`None` 또는 UNIX epoch) 전역 최소/최대를
    /// 한 번 조회해 대체합니다. 저장소가 비어 있으면 빈 결과, 역전된 범위도
    /// 오류 없이 빈 결과입니다.
    async fn list_rate_values_by_range(
        &self,
        filter: &CurrencyFilter,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<RateValue>> {
        let bounds = if needs_global_bounds(start, end) {
            self.rate_time_bounds().await?
        } else {
            None
        };

        match resolve_range(start, end, bounds) {
            Some((start, end)) if start <= end => {
                self.list_rate_values_between(filter, start, end).await
            }
            _ => Ok(Vec::new()),
        }
    }
}
