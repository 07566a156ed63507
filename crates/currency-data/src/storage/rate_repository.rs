//! 환율 Repository (PostgreSQL).
//!
//! 테이블:
//! - `requests_status`: 요청 감사 로그
//! - `currencies_values`: 통화별 환율 값, `UNIQUE (name, request_id)`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::types::PgInterval;
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{Database, RateStore};
use crate::error::{DataError, Result};
use crate::model::{is_currency_code, CurrencyFilter, FetchAudit, NewFetchAudit, RateValue};

/// PostgreSQL 바인드 파라미터 상한.
const MAX_BIND_PARAMS: usize = 65_535;

/// 환율 값 1행당 바인드 파라미터 수.
const PARAMS_PER_RATE: usize = 4;

/// 한 번의 INSERT로 저장 가능한 최대 행 수.
pub const MAX_BATCH_ROWS: usize = MAX_BIND_PARAMS / PARAMS_PER_RATE;

/// `requests_status` 행.
#[derive(Debug, FromRow)]
struct FetchAuditRow {
    id: i64,
    url: String,
    time_elapsed: PgInterval,
    status: String,
    requested_at: DateTime<Utc>,
}

impl TryFrom<FetchAuditRow> for FetchAudit {
    type Error = DataError;

    fn try_from(row: FetchAuditRow) -> Result<Self> {
        Ok(FetchAudit {
            id: row.id,
            url: row.url,
            elapsed: interval_to_duration(&row.time_elapsed)?,
            status: row.status.parse()?,
            requested_at: row.requested_at,
        })
    }
}

/// INTERVAL은 마이크로초 정밀도이므로 나노초는 버립니다.
fn duration_to_interval(elapsed: Duration) -> Result<PgInterval> {
    let micros = u64::try_from(elapsed.as_micros())
        .map_err(|_| DataError::InvalidData("elapsed time out of range".to_string()))?;

    PgInterval::try_from(Duration::from_micros(micros))
        .map_err(|e| DataError::InvalidData(format!("elapsed time out of range: {e}")))
}

fn interval_to_duration(interval: &PgInterval) -> Result<Duration> {
    const MICROS_PER_DAY: i64 = 86_400_000_000;

    let micros = i64::from(interval.months)
        .checked_mul(30 * MICROS_PER_DAY)
        .and_then(|m| m.checked_add(i64::from(interval.days) * MICROS_PER_DAY))
        .and_then(|m| m.checked_add(interval.microseconds))
        .ok_or_else(|| DataError::InvalidData("interval overflow".to_string()))?;

    u64::try_from(micros)
        .map(Duration::from_micros)
        .map_err(|_| DataError::InvalidData(format!("negative interval: {micros}us")))
}

/// 배치 사전 검증.
///
/// 잘못된 행이 하나라도 있으면 전체 배치를 거부합니다.
fn validate_batch(batch: &[RateValue]) -> Result<()> {
    if batch.len() > MAX_BATCH_ROWS {
        return Err(DataError::InvalidData(format!(
            "batch of {} rows exceeds the limit of {}",
            batch.len(),
            MAX_BATCH_ROWS
        )));
    }

    if let Some(bad) = batch.iter().find(|rate| !is_currency_code(&rate.name)) {
        return Err(DataError::InvalidData(format!(
            "invalid currency code '{}' (request {})",
            bad.name, bad.request_id
        )));
    }

    Ok(())
}

/// 환율 Repository.
#[derive(Debug, Clone)]
pub struct RateRepository {
    db: Database,
}

impl RateRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 내부 Database 핸들
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// ID로 요청 감사 레코드를 조회합니다.
    #[instrument(skip(self))]
    pub async fn fetch_audit_by_id(&self, id: i64) -> Result<Option<FetchAudit>> {
        let pool = self.db.ensure_connected().await?;

        let row: Option<FetchAuditRow> = sqlx::query_as(
            r#"
            SELECT id, url, time_elapsed, status, requested_at
            FROM requests_status
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| DataError::query("select fetch audit", e))?;

        row.map(FetchAudit::try_from).transpose()
    }
}

#[async_trait]
impl RateStore for RateRepository {
    #[instrument(skip(self, record), fields(url = %record.url, status = %record.status))]
    async fn insert_fetch_audit(&self, record: &NewFetchAudit) -> Result<i64> {
        let elapsed = duration_to_interval(record.elapsed)?;
        let pool = self.db.ensure_connected().await?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DataError::insert("begin fetch audit transaction", e))?;

        let inserted: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO requests_status (time_elapsed, url, status, requested_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(elapsed)
        .bind(&record.url)
        .bind(record.status.as_str())
        .bind(record.requested_at)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok((id,)) => {
                tx.commit()
                    .await
                    .map_err(|e| DataError::insert("commit fetch audit", e))?;
                debug!(id, "Fetch audit stored");
                Ok(id)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Fetch audit rollback failed");
                }
                Err(DataError::insert("insert fetch audit", e))
            }
        }
    }

    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    async fn bulk_insert_rate_values(&self, batch: &[RateValue]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        validate_batch(batch)?;

        let pool = self.db.ensure_connected().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DataError::insert("begin rate values transaction", e))?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO currencies_values (name, request_id, value, last_updated_at) ",
        );
        builder.push_values(batch, |mut row, rate| {
            row.push_bind(rate.name.clone())
                .push_bind(rate.request_id)
                .push_bind(rate.value)
                .push_bind(rate.last_updated_at);
        });

        match builder.build().execute(&mut *tx).await {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|e| DataError::insert("commit rate values", e))?;
                debug!(inserted = result.rows_affected(), "Rate values stored");
                Ok(result.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rate values rollback failed");
                }
                Err(DataError::insert("bulk insert rate values", e))
            }
        }
    }

    #[instrument(skip(self))]
    async fn rate_time_bounds(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let pool = self.db.ensure_connected().await?;

        let (min, max): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT MIN(last_updated_at), MAX(last_updated_at) FROM currencies_values",
        )
        .fetch_one(&pool)
        .await
        .map_err(|e| DataError::query("select rate time bounds", e))?;

        Ok(min.zip(max))
    }

    #[instrument(skip(self, filter), fields(filter = %filter))]
    async fn list_rate_values_between(
        &self,
        filter: &CurrencyFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RateValue>> {
        let pool = self.db.ensure_connected().await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT name, request_id, value, last_updated_at FROM currencies_values \
             WHERE last_updated_at BETWEEN ",
        );
        builder.push_bind(start).push(" AND ").push_bind(end);

        if let Some(code) = filter.code() {
            builder.push(" AND name = ").push_bind(code.to_string());
        }

        builder.push(" ORDER BY last_updated_at, request_id, name");

        let rates: Vec<RateValue> = builder
            .build_query_as()
            .fetch_all(&pool)
            .await
            .map_err(|e| DataError::query("select rate values", e))?;

        debug!(count = rates.len(), "Rate values loaded");
        Ok(rates)
    }

    async fn health_check(&self) -> Result<()> {
        self.db.health_check().await
    }
}
