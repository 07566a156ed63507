//! 환율 공급자 모듈.
//!
//! ## Currency API
//! - `CurrencyApiClient`: `apikey` 헤더 인증, 고정 타임아웃, 외부 취소 토큰 지원
//! - 응답 본문은 해석하지 않고 원시 바이트로 반환 (해석은 수집기 책임)
//!
//! 수집 결과는 성공/실패와 관계없이 [`FetchMetadata`]를 포함하므로
//! 호출자는 항상 감사 레코드를 남길 수 있습니다.

pub mod currency_api;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model::{FetchStatus, NewFetchAudit};

pub use currency_api::{CurrencyApiClient, CurrencyApiConfig};

/// 공급자 오류.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 필수 설정 누락 (생성 시점에만 발생)
    #[error("Provider configuration error: {0}")]
    Config(String),

    /// 고정 타임아웃 초과
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// 외부 취소 토큰에 의해 중단
    #[error("Request cancelled")]
    Cancelled,

    /// 연결/본문 읽기 실패
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx가 아닌 HTTP 응답
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

/// 요청 1회의 메타데이터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    /// 요청 URL
    pub url: String,
    /// 요청 시작부터 종료(성공/실패)까지 걸린 시간
    pub elapsed: Duration,
    /// 요청 결과
    pub status: FetchStatus,
    /// 요청 시작 시각
    pub requested_at: DateTime<Utc>,
}

impl FetchMetadata {
    /// 감사 레코드로 변환
    pub fn to_audit(&self) -> NewFetchAudit {
        NewFetchAudit {
            url: self.url.clone(),
            elapsed: self.elapsed,
            status: self.status,
            requested_at: self.requested_at,
        }
    }
}

/// 요청 1회의 결과.
///
/// `metadata.status`는 `result`의 성공 여부와 항상 일치합니다.
#[derive(Debug)]
pub struct FetchOutcome {
    pub metadata: FetchMetadata,
    /// 성공 시 원시 응답 본문
    pub result: Result<Vec<u8>, ProviderError>,
}

impl FetchOutcome {
    /// 성공 결과 생성
    pub fn success(
        url: impl Into<String>,
        requested_at: DateTime<Utc>,
        elapsed: Duration,
        body: Vec<u8>,
    ) -> Self {
        Self {
            metadata: FetchMetadata {
                url: url.into(),
                elapsed,
                status: FetchStatus::Success,
                requested_at,
            },
            result: Ok(body),
        }
    }

    /// 실패 결과 생성
    pub fn failure(
        url: impl Into<String>,
        requested_at: DateTime<Utc>,
        elapsed: Duration,
        error: ProviderError,
    ) -> Self {
        Self {
            metadata: FetchMetadata {
                url: url.into(),
                elapsed,
                status: FetchStatus::Failure,
                requested_at,
            },
            result: Err(error),
        }
    }
}

/// 환율 공급자 trait.
///
/// 구현체는 호출당 정확히 한 번의 외부 요청을 보내야 하며,
/// 자체 타임아웃과 `cancel` 토큰 중 먼저 발생한 쪽에서 중단합니다.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// 최신 환율 원시 데이터 요청
    async fn fetch(&self, cancel: CancellationToken) -> FetchOutcome;

    /// 요청 대상 URL (로그용)
    fn url(&self) -> &str;

    /// 요청당 타임아웃
    fn timeout(&self) -> Duration;
}
