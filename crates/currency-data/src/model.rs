//! 환율 도메인 모델.
//!
//! - [`FetchAudit`]: 공급자 요청 1회당 1행 (`requests_status`)
//! - [`RateValue`]: 요청 1회의 통화별 환율 값 (`currencies_values`)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DataError;

/// "전체 통화"를 의미하는 필터 값 (대소문자 무시).
pub const ALL_CURRENCIES: &str = "all";

/// 요청 결과 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// 응답 본문 수신 완료
    Success,
    /// 타임아웃, 전송 실패, 취소
    Failure,
}

impl FetchStatus {
    /// DB 저장용 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchStatus {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(DataError::InvalidData(format!("unknown fetch status: {other}"))),
        }
    }
}

/// 저장 전 요청 감사 레코드.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFetchAudit {
    /// 요청 URL
    pub url: String,
    /// 요청 소요 시간
    pub elapsed: Duration,
    /// 요청 결과
    pub status: FetchStatus,
    /// 요청 시각
    pub requested_at: DateTime<Utc>,
}

/// 저장된 요청 감사 레코드.
///
/// 한 번 기록되면 수정/삭제되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAudit {
    /// 저장소가 부여한 식별자 (단조 증가)
    pub id: i64,
    pub url: String,
    pub elapsed: Duration,
    pub status: FetchStatus,
    pub requested_at: DateTime<Utc>,
}

/// 통화별 환율 값.
///
/// `last_updated_at`은 공급자가 보고한 기준 시각이며 범위 조회의 기준입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RateValue {
    /// 통화 코드 (대문자 3자리)
    pub name: String,
    /// 이 값을 가져온 요청의 감사 레코드 ID
    pub request_id: i64,
    /// 환율
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    /// 공급자 기준 시각
    pub last_updated_at: DateTime<Utc>,
}

/// 통화 필터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyFilter {
    /// 전체 통화
    All,
    /// 특정 통화 코드 (정확히 일치)
    Code(String),
}

impl CurrencyFilter {
    /// 요청 값에서 필터 생성.
    ///
    /// `all`(대소문자 무시)은 전체 통화, 그 외에는 코드 그대로 비교합니다.
    pub fn from_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_CURRENCIES) {
            Self::All
        } else {
            Self::Code(value.to_string())
        }
    }

    /// SQL 바인딩용 코드 (전체면 None)
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Code(code) => Some(code.as_str()),
        }
    }

    /// 주어진 통화 코드가 필터에 해당하는지 확인
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Code(code) => code == name,
        }
    }
}

impl fmt::Display for CurrencyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_CURRENCIES),
            Self::Code(code) => f.write_str(code),
        }
    }
}

/// 저장 가능한 통화 코드인지 확인 (ASCII 대문자 3자리).
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_roundtrip() {
        assert_eq!("success".parse::<FetchStatus>().unwrap(), FetchStatus::Success);
        assert_eq!("failure".parse::<FetchStatus>().unwrap(), FetchStatus::Failure);
        assert!("pending".parse::<FetchStatus>().is_err());
        assert_eq!(FetchStatus::Failure.to_string(), "failure");
    }

    #[test]
    fn test_currency_filter_sentinel_is_case_insensitive() {
        assert_eq!(CurrencyFilter::from_value("all"), CurrencyFilter::All);
        assert_eq!(CurrencyFilter::from_value("ALL"), CurrencyFilter::All);
        assert_eq!(CurrencyFilter::from_value("aLl"), CurrencyFilter::All);
        assert_eq!(
            CurrencyFilter::from_value("USD"),
            CurrencyFilter::Code("USD".to_string())
        );
    }

    #[test]
    fn test_currency_filter_matches_exactly() {
        let usd = CurrencyFilter::Code("USD".to_string());
        assert!(usd.matches("USD"));
        assert!(!usd.matches("usd"));
        assert!(!usd.matches("EUR"));
        assert!(CurrencyFilter::All.matches("EUR"));
        assert_eq!(usd.code(), Some("USD"));
        assert_eq!(CurrencyFilter::All.code(), None);
    }

    #[test]
    fn test_is_currency_code() {
        assert!(is_currency_code("USD"));
        assert!(!is_currency_code("usd"));
        assert!(!is_currency_code("US"));
        assert!(!is_currency_code("USDT"));
        assert!(!is_currency_code("U5D"));
    }

    #[test]
    fn test_rate_value_serializes_value_as_number() {
        let rate = RateValue {
            name: "EUR".to_string(),
            request_id: 7,
            value: rust_decimal_macros::dec!(0.9312),
            last_updated_at: DateTime::parse_from_rfc3339("2022-10-17T23:59:59Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(json["name"], "EUR");
        assert_eq!(json["request_id"], 7);
        assert!(json["value"].is_number());
        assert_eq!(json["last_updated_at"], "2022-10-17T23:59:59Z");
    }
}
