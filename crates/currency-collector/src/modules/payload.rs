//! 공급자 응답 본문 해석.
//!
//! ```json
//! {
//!   "meta": { "last_updated_at": "2022-10-17T23:59:59Z" },
//!   "data": { "EUR": { "code": "EUR", "value": 1.02 } }
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use currency_data::RateValue;

/// `meta.last_updated_at` 형식 (UTC).
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 본문 해석 에러.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// JSON 형식 오류
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// 필수 필드 누락
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// 시각 형식 오류
    #[error("invalid last_updated_at '{0}'")]
    InvalidTimestamp(String),

    /// 환율 값 형식 오류
    #[error("invalid value for {code}: {value}")]
    InvalidValue { code: String, value: String },
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    meta: Option<RawMeta>,
    data: Option<BTreeMap<String, RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    last_updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    code: Option<String>,
    value: Option<serde_json::Value>,
}

/// 해석된 최신 환율.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRates {
    /// 공급자 기준 시각
    pub last_updated_at: DateTime<Utc>,
    /// (통화 코드, 환율), 코드 순
    pub rates: Vec<(String, Decimal)>,
}

impl LatestRates {
    /// 저장용 환율 값으로 변환
    pub fn into_rate_values(self, request_id: i64) -> Vec<RateValue> {
        let last_updated_at = self.last_updated_at;
        self.rates
            .into_iter()
            .map(|(name, value)| RateValue {
                name,
                request_id,
                value,
                last_updated_at,
            })
            .collect()
    }
}

/// 응답 본문 해석.
///
/// 항목의 `code`가 없으면 `data`의 키를 통화 코드로 사용합니다.
pub fn parse_latest_rates(body: &[u8]) -> Result<LatestRates, PayloadError> {
    let raw: RawPayload = serde_json::from_slice(body)?;

    let stamp = raw
        .meta
        .and_then(|meta| meta.last_updated_at)
        .ok_or(PayloadError::MissingField("meta.last_updated_at"))?;
    let last_updated_at = NaiveDateTime::parse_from_str(&stamp, LAST_UPDATED_FORMAT)
        .map_err(|_| PayloadError::InvalidTimestamp(stamp.clone()))?
        .and_utc();

    let data = raw.data.ok_or(PayloadError::MissingField("data"))?;

    let rates = data
        .into_iter()
        .map(|(key, entry)| -> Result<(String, Decimal), PayloadError> {
            let code = entry.code.unwrap_or(key);
            let value = parse_value(&code, entry.value)?;
            Ok((code, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LatestRates {
        last_updated_at,
        rates,
    })
}

fn parse_value(code: &str, value: Option<serde_json::Value>) -> Result<Decimal, PayloadError> {
    let text = match value {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => {
            return Err(PayloadError::InvalidValue {
                code: code.to_string(),
                value: "null".to_string(),
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| PayloadError::InvalidValue {
            code: code.to_string(),
            value: text,
        })
}
