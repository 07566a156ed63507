//! 환경변수 기반 설정 모듈.
//!
//! 공급자 URL, API 키, 타임아웃, 수집 주기는 모두 필수이며
//! 누락되거나 잘못된 값은 시작 단계에서 [`CollectorError::Config`]로 실패합니다.

use std::str::FromStr;
use std::time::Duration;

use currency_data::{CurrencyApiConfig, DatabaseConfig};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 환율 공급자 설정
    pub provider: CurrencyApiConfig,
    /// 수집 스케줄 설정
    pub schedule: ScheduleConfig,
}

/// 수집 스케줄 설정
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    /// 수집 주기
    pub interval: Duration,
    /// 종료 시 진행 중 작업을 기다리는 최대 시간
    pub shutdown_grace: Duration,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정 로드.
    ///
    /// 빈 문자열은 설정되지 않은 것으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut database = DatabaseConfig::with_url(database_url(&get)?);
        if let Some(max) = parse_optional::<u32>(&get, "DB_MAX_CONNECTIONS")? {
            database.max_connections = max;
        }

        let url = require(&get, "CURRENCY_API_URL")?;
        let api_key = require(&get, "CURRENCY_API_KEY")?;
        let timeout = require_duration(&get, "CURRENCY_API_TIMEOUT")?;
        let interval = require_duration(&get, "REQUEST_INTERVAL")?;

        let grace_secs = parse_optional::<u64>(&get, "SHUTDOWN_GRACE_SECS")?.unwrap_or(10);

        Ok(Self {
            database,
            provider: CurrencyApiConfig::new(url, api_key, timeout),
            schedule: ScheduleConfig {
                interval,
                shutdown_grace: Duration::from_secs(grace_secs),
            },
        })
    }
}

/// `DATABASE_URL`, 없으면 `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASS`/`DB_NAME`으로 구성
fn database_url(get: &impl Fn(&str) -> Option<String>) -> Result<String> {
    if let Some(url) = get("DATABASE_URL") {
        return Ok(url);
    }

    let Some(host) = get("DB_HOST") else {
        return Err(CollectorError::Config(
            "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
        ));
    };

    let port = parse_optional::<u16>(get, "DB_PORT")?.unwrap_or(5432);
    let user = require(get, "DB_USER")?;
    let password = get("DB_PASS").unwrap_or_default();
    let name = require(get, "DB_NAME")?;

    Ok(DatabaseConfig::url_from_parts(&host, port, &user, &password, &name)?)
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| CollectorError::Config(format!("{key} 환경변수가 설정되지 않았습니다")))
}

fn require_duration(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Duration> {
    let raw = require(get, key)?;
    let duration = parse_duration(&raw)
        .map_err(|e| CollectorError::Config(format!("{key}='{raw}' 형식 오류: {e}")))?;

    if duration.is_zero() {
        return Err(CollectorError::Config(format!("{key}는 0보다 커야 합니다")));
    }
    Ok(duration)
}

/// 선택 값 파싱 (설정되었는데 형식이 틀리면 에러)
fn parse_optional<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CollectorError::Config(format!("{key}='{raw}' 형식 오류"))),
    }
}

/// 기간 문자열 파싱.
///
/// `500ms`, `3s`, `1.5s`, `2m`, `1h30m` 형식을 지원합니다
/// (단위: `ns`, `us`, `ms`, `s`, `m`, `h`). 단위 없는 `0`도 허용합니다.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err("negative duration".to_string());
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s.strip_prefix('+').unwrap_or(s);

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(num_len);
        if number.is_empty() || number == "." {
            return Err(format!("invalid number in '{input}'"));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number '{number}'"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            "" => return Err(format!("missing unit in '{input}'")),
            other => return Err(format!("unknown unit '{other}'")),
        };

        total_nanos += value * scale;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration '{input}' out of range"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/currency"),
        ("CURRENCY_API_URL", "https://api.currencyapi.com/v3/latest"),
        ("CURRENCY_API_KEY", "API_KEY"),
        ("CURRENCY_API_TIMEOUT", "3s"),
        ("REQUEST_INTERVAL", "10s"),
    ];

    fn with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs: Vec<_> = BASE
            .iter()
            .filter(|(k, _)| !overrides.iter().any(|(o, _)| o == k))
            .copied()
            .collect();
        pairs.extend_from_slice(overrides);
        pairs
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("ten seconds").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("-3s").is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = CollectorConfig::from_lookup(lookup(BASE)).unwrap();

        assert_eq!(config.database.url, "postgres://localhost/currency");
        assert_eq!(config.provider.url, "https://api.currencyapi.com/v3/latest");
        assert_eq!(config.provider.timeout, Duration::from_secs(3));
        assert_eq!(config.schedule.interval, Duration::from_secs(10));
        assert_eq!(config.schedule.shutdown_grace, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_required_value_fails() {
        for key in ["CURRENCY_API_URL", "CURRENCY_API_KEY", "CURRENCY_API_TIMEOUT", "REQUEST_INTERVAL"] {
            let pairs: Vec<_> = BASE.iter().filter(|(k, _)| *k != key).copied().collect();
            let err = CollectorConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(
                matches!(&err, CollectorError::Config(msg) if msg.contains(key)),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn test_invalid_interval_fails_startup() {
        let err = CollectorConfig::from_lookup(lookup(&with(&[("REQUEST_INTERVAL", "soon")])))
            .unwrap_err();
        assert!(matches!(err, CollectorError::Config(_)));

        let err = CollectorConfig::from_lookup(lookup(&with(&[("REQUEST_INTERVAL", "0s")])))
            .unwrap_err();
        assert!(matches!(err, CollectorError::Config(_)));
    }

    #[test]
    fn test_invalid_optional_number_fails() {
        let err = CollectorConfig::from_lookup(lookup(&with(&[("DB_MAX_CONNECTIONS", "many")])))
            .unwrap_err();
        assert!(matches!(err, CollectorError::Config(_)));
    }

    #[test]
    fn test_database_url_from_parts() {
        let pairs: Vec<_> = BASE
            .iter()
            .filter(|(k, _)| *k != "DATABASE_URL")
            .copied()
            .chain([
                ("DB_HOST", "db"),
                ("DB_PORT", "5433"),
                ("DB_USER", "app"),
                ("DB_PASS", "secret"),
                ("DB_NAME", "rates"),
            ])
            .collect();

        let config = CollectorConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.database.url,
            "postgres://app:secret@db:5433/rates?sslmode=disable"
        );
    }
}
