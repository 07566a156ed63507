//! 테스트용 공급자.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use currency_data::{FetchOutcome, ProviderError, RateProvider};

pub const SAMPLE_PAYLOAD: &str = r#"{
    "meta": {"last_updated_at": "2022-10-17T23:59:59Z"},
    "data": {
        "EUR": {"code": "EUR", "value": 1.022133},
        "JPY": {"code": "JPY", "value": 148.9},
        "USD": {"code": "USD", "value": 1}
    }
}"#;

const FAKE_URL: &str = "http://fake-provider/v3/latest";

/// 고정 응답 또는 타임아웃을 흉내내는 공급자
pub struct FakeProvider {
    body: Option<Vec<u8>>,
    delay: Duration,
    timeout: Duration,
    calls: AtomicUsize,
}

impl FakeProvider {
    /// 즉시 `body`를 반환
    pub fn body(body: &str) -> Self {
        Self::delayed(body, Duration::ZERO)
    }

    /// `delay` 후 `body`를 반환
    pub fn delayed(body: &str, delay: Duration) -> Self {
        Self {
            body: Some(body.as_bytes().to_vec()),
            delay,
            timeout: Duration::from_secs(3600),
            calls: AtomicUsize::new(0),
        }
    }

    /// 응답 없이 `timeout` 후 타임아웃 실패
    pub fn hanging(timeout: Duration) -> Self {
        Self {
            body: None,
            delay: timeout,
            timeout,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for FakeProvider {
    async fn fetch(&self, cancel: CancellationToken) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let requested_at = Utc::now();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(self.delay) => match &self.body {
                Some(body) => Ok(body.clone()),
                None => Err(ProviderError::Timeout(self.timeout)),
            },
        };

        match result {
            Ok(body) => FetchOutcome::success(FAKE_URL, requested_at, started.elapsed(), body),
            Err(e) => FetchOutcome::failure(FAKE_URL, requested_at, started.elapsed(), e),
        }
    }

    fn url(&self) -> &str {
        FAKE_URL
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
