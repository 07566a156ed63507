//! 에러 타입 정의.

use std::fmt;

use currency_data::{DataError, ProviderError};

use crate::modules::payload::PayloadError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 저장소 에러
    Database(DataError),
    /// 설정 에러 (시작 시 치명적)
    Config(String),
    /// 환율 공급자 에러
    Provider(ProviderError),
    /// 응답 본문 해석 에러
    Payload(PayloadError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Provider(e) => write!(f, "Provider error: {}", e),
            Self::Payload(e) => write!(f, "Payload error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            Self::Provider(e) => Some(e),
            Self::Payload(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Database(err)
    }
}

impl From<ProviderError> for CollectorError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<PayloadError> for CollectorError {
    fn from(err: PayloadError) -> Self {
        Self::Payload(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
