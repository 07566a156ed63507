//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::modules::rate_collect::{CycleOutcome, CycleReport};

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 수집 주기 수
    pub total: usize,
    /// 환율 값까지 저장된 주기 수
    pub success: usize,
    /// 요청 실패 (타임아웃, 전송 실패, 취소)
    pub fetch_failures: usize,
    /// 응답 해석 실패
    pub parse_errors: usize,
    /// 저장 실패 (감사 레코드 또는 환율 값)
    pub store_errors: usize,
    /// 저장된 총 환율 값 수
    pub total_rates: u64,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집 주기 결과 반영
    pub fn record(&mut self, report: &CycleReport) {
        self.total += 1;
        self.elapsed += report.elapsed;
        self.total_rates += report.rates_written;

        match report.outcome {
            CycleOutcome::Stored => self.success += 1,
            CycleOutcome::FetchFailed => self.fetch_failures += 1,
            CycleOutcome::ParseFailed => self.parse_errors += 1,
            CycleOutcome::AuditFailed | CycleOutcome::StoreFailed => self.store_errors += 1,
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            fetch_failures = self.fetch_failures,
            parse_errors = self.parse_errors,
            store_errors = self.store_errors,
            total_rates = self.total_rates,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
