//! 환율 데이터 관리 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 환율 공급자 HTTP 클라이언트 (타임아웃/취소 지원)
//! - PostgreSQL 저장소 (요청 감사 로그, 통화별 환율 값)
//! - 날짜 범위 조회 서비스 (범위 미지정 시 저장된 최소/최대 시각으로 대체)

pub mod error;
pub mod model;
pub mod provider;
pub mod query;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::{DataError, Result};
pub use model::{
    is_currency_code, CurrencyFilter, FetchAudit, FetchStatus, NewFetchAudit, RateValue,
    ALL_CURRENCIES,
};

// 공급자 재내보내기
pub use provider::{
    CurrencyApiClient, CurrencyApiConfig, FetchMetadata, FetchOutcome, ProviderError,
    RateProvider,
};

// 저장소 재내보내기
pub use storage::{Database, DatabaseConfig, RateRepository, RateStore};

// 조회 서비스 재내보내기
pub use query::{resolve_range, RateQueryService};
