//! 환율 수집 주기.
//!
//! 1회 주기: 요청 → 감사 레코드 저장 → (성공 시) 본문 해석 → 환율 값 일괄 저장.
//! 감사 레코드는 요청 결과와 관계없이 항상 먼저 저장을 시도합니다.

use std::time::Duration;

use currency_data::{FetchStatus, RateProvider, RateStore};
use tokio_util::sync::CancellationToken;

use super::payload::parse_latest_rates;

/// 주기 결과 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 환율 값 저장 완료
    Stored,
    /// 요청 실패
    FetchFailed,
    /// 응답 해석 실패
    ParseFailed,
    /// 감사 레코드 저장 실패 (환율 값은 저장하지 않음)
    AuditFailed,
    /// 환율 값 저장 실패
    StoreFailed,
}

impl CycleOutcome {
    /// 메트릭 라벨
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
            Self::AuditFailed => "audit_failed",
            Self::StoreFailed => "store_failed",
        }
    }
}

/// 1회 주기 결과
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// 저장된 감사 레코드 ID
    pub audit_id: Option<i64>,
    /// 요청 결과
    pub status: FetchStatus,
    /// 요청 소요 시간
    pub elapsed: Duration,
    /// 저장된 환율 값 수
    pub rates_written: u64,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn new(status: FetchStatus, elapsed: Duration) -> Self {
        Self {
            audit_id: None,
            status,
            elapsed,
            rates_written: 0,
            outcome: CycleOutcome::FetchFailed,
        }
    }

    fn finish(mut self, outcome: CycleOutcome) -> Self {
        self.outcome = outcome;
        metrics::counter!("rate_fetch_cycles_total", "status" => outcome.as_str()).increment(1);
        metrics::histogram!("rate_fetch_duration_seconds").record(self.elapsed.as_secs_f64());
        if self.rates_written > 0 {
            metrics::counter!("rate_values_written_total").increment(self.rates_written);
        }
        self
    }
}

/// 환율 수집 1회 실행.
///
/// `cancel`은 진행 중인 요청만 중단합니다. 감사 레코드는 그래도 저장됩니다.
pub async fn run_cycle(
    provider: &dyn RateProvider,
    store: &dyn RateStore,
    cancel: CancellationToken,
) -> CycleReport {
    let outcome = provider.fetch(cancel).await;
    let meta = &outcome.metadata;
    let details = outcome
        .result
        .as_ref()
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();

    tracing::info!(
        url = %meta.url,
        time_elapsed = ?meta.elapsed,
        status = %meta.status,
        requested_at = %meta.requested_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        details = %details,
        "Request"
    );

    let mut report = CycleReport::new(meta.status, meta.elapsed);

    match store.insert_fetch_audit(&meta.to_audit()).await {
        Ok(id) => report.audit_id = Some(id),
        Err(e) => tracing::warn!(error = %e, "요청 감사 레코드 저장 실패"),
    }

    let body = match outcome.result {
        Ok(body) => body,
        Err(_) => return report.finish(CycleOutcome::FetchFailed),
    };

    let latest = match parse_latest_rates(&body) {
        Ok(latest) => latest,
        Err(e) => {
            tracing::warn!(error = %e, "응답 해석 실패");
            return report.finish(CycleOutcome::ParseFailed);
        }
    };

    let Some(request_id) = report.audit_id else {
        tracing::warn!(
            rates = latest.rates.len(),
            "감사 레코드 ID가 없어 환율 값을 저장하지 않습니다"
        );
        return report.finish(CycleOutcome::AuditFailed);
    };

    let values = latest.into_rate_values(request_id);
    match store.bulk_insert_rate_values(&values).await {
        Ok(written) => {
            report.rates_written = written;
            tracing::debug!(request_id, written, "환율 값 저장 완료");
            report.finish(CycleOutcome::Stored)
        }
        Err(e) => {
            tracing::warn!(request_id, error = %e, "환율 값 일괄 저장 실패");
            report.finish(CycleOutcome::StoreFailed)
        }
    }
}
