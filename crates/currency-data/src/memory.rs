//! 인메모리 [`RateStore`] 구현 (테스트용).
//!
//! PostgreSQL 구현과 같은 규칙을 따릅니다: ID는 1부터 단조 증가,
//! `(name, request_id)` 고유, 배치는 전부 저장되거나 전혀 저장되지 않음.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{DataError, Result};
use crate::model::{is_currency_code, CurrencyFilter, FetchAudit, NewFetchAudit, RateValue};
use crate::storage::RateStore;

#[derive(Default)]
struct Inner {
    audits: Vec<FetchAudit>,
    rates: Vec<RateValue>,
}

/// 인메모리 환율 저장소.
#[derive(Default)]
pub struct MemoryRateStore {
    inner: Mutex<Inner>,
    fail_audits: AtomicBool,
    fail_rates: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 감사 레코드 쓰기 실패 주입
    pub fn fail_audits(&self, fail: bool) {
        self.fail_audits.store(fail, Ordering::SeqCst);
    }

    /// 환율 값 쓰기 실패 주입
    pub fn fail_rates(&self, fail: bool) {
        self.fail_rates.store(fail, Ordering::SeqCst);
    }

    /// 조회 실패 주입
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// 저장된 감사 레코드 스냅샷
    pub fn audits(&self) -> Vec<FetchAudit> {
        self.lock().audits.clone()
    }

    /// 저장된 환율 값 스냅샷
    pub fn rates(&self) -> Vec<RateValue> {
        self.lock().rates.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DataError::QueryError("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn insert_fetch_audit(&self, record: &NewFetchAudit) -> Result<i64> {
        if self.fail_audits.load(Ordering::SeqCst) {
            return Err(DataError::InsertError("injected audit failure".to_string()));
        }

        let mut inner = self.lock();
        let id = inner.audits.len() as i64 + 1;
        inner.audits.push(FetchAudit {
            id,
            url: record.url.clone(),
            elapsed: record.elapsed,
            status: record.status,
            requested_at: record.requested_at,
        });
        Ok(id)
    }

    async fn bulk_insert_rate_values(&self, batch: &[RateValue]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        if self.fail_rates.load(Ordering::SeqCst) {
            return Err(DataError::InsertError("injected rate failure".to_string()));
        }
        if let Some(bad) = batch.iter().find(|rate| !is_currency_code(&rate.name)) {
            return Err(DataError::InvalidData(format!(
                "invalid currency code '{}'",
                bad.name
            )));
        }

        let mut inner = self.lock();
        let mut keys: HashSet<(String, i64)> = inner
            .rates
            .iter()
            .map(|rate| (rate.name.clone(), rate.request_id))
            .collect();

        for rate in batch {
            if !keys.insert((rate.name.clone(), rate.request_id)) {
                return Err(DataError::DuplicateError(format!(
                    "({}, {}) already exists",
                    rate.name, rate.request_id
                )));
            }
        }

        inner.rates.extend_from_slice(batch);
        Ok(batch.len() as u64)
    }

    async fn rate_time_bounds(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        self.check_read()?;

        let inner = self.lock();
        let min = inner.rates.iter().map(|r| r.last_updated_at).min();
        let max = inner.rates.iter().map(|r| r.last_updated_at).max();
        Ok(min.zip(max))
    }

    async fn list_rate_values_between(
        &self,
        filter: &CurrencyFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RateValue>> {
        self.check_read()?;

        let mut rates: Vec<RateValue> = self
            .lock()
            .rates
            .iter()
            .filter(|r| filter.matches(&r.name))
            .filter(|r| r.last_updated_at >= start && r.last_updated_at <= end)
            .cloned()
            .collect();

        rates.sort_by(|a, b| {
            a.last_updated_at
                .cmp(&b.last_updated_at)
                .then(a.request_id.cmp(&b.request_id))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rates)
    }

    async fn health_check(&self) -> Result<()> {
        self.check_read()
    }
}
