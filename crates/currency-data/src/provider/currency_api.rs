//! Currency API 클라이언트.
//!
//! 최신 환율을 `GET {url}` + `apikey` 헤더로 요청합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use currency_data::provider::{CurrencyApiClient, CurrencyApiConfig, RateProvider};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = CurrencyApiClient::new(CurrencyApiConfig::new(
//!     "https://api.currencyapi.com/v3/latest",
//!     "YOUR_API_KEY",
//!     std::time::Duration::from_secs(3),
//! ))?;
//!
//! let outcome = client.fetch(CancellationToken::new()).await;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{FetchOutcome, ProviderError, RateProvider};

/// 인증 헤더 이름.
const API_KEY_HEADER: &str = "apikey";

/// Currency API 설정.
///
/// URL, API 키, 타임아웃 모두 필수입니다.
#[derive(Debug)]
pub struct CurrencyApiConfig {
    /// 요청 URL
    pub url: String,
    /// API 키
    pub api_key: SecretString,
    /// 요청당 타임아웃 (0 불가)
    pub timeout: Duration,
}

impl CurrencyApiConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            api_key: SecretString::from(api_key.into()),
            timeout,
        }
    }

    /// 필수 값 검증.
    pub fn validate(&self) -> Result<Url, ProviderError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ProviderError::Config(
                "the API key must not be empty".to_string(),
            ));
        }

        if self.url.trim().is_empty() {
            return Err(ProviderError::Config("the URL must not be empty".to_string()));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| ProviderError::Config(format!("invalid URL '{}': {}", self.url, e)))?;

        if self.timeout.is_zero() {
            return Err(ProviderError::Config("the timeout must not be 0".to_string()));
        }

        Ok(url)
    }
}

/// Currency API 클라이언트.
pub struct CurrencyApiClient {
    client: reqwest::Client,
    url: Url,
    url_text: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl std::fmt::Debug for CurrencyApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyApiClient")
            .field("url", &self.url_text)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CurrencyApiClient {
    /// 설정을 검증하고 클라이언트를 생성합니다.
    ///
    /// 필수 값이 비어 있으면 `ProviderError::Config`를 반환합니다.
    pub fn new(config: CurrencyApiConfig) -> Result<Self, ProviderError> {
        let url = config.validate()?;

        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ProviderError::Config("the API key is not a valid header value".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_text: url.to_string(),
            url,
            headers,
            timeout: config.timeout,
        })
    }

    /// 요청 전송 및 본문 수신.
    async fn request(&self) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(self.url.clone())
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl RateProvider for CurrencyApiClient {
    async fn fetch(&self, cancel: CancellationToken) -> FetchOutcome {
        let requested_at = Utc::now();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            res = tokio::time::timeout(self.timeout, self.request()) => match res {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            },
        };

        let elapsed = started.elapsed();
        debug!(url = %self.url_text, ?elapsed, ok = result.is_ok(), "환율 요청 완료");

        match result {
            Ok(body) => FetchOutcome::success(&self.url_text, requested_at, elapsed, body),
            Err(e) => FetchOutcome::failure(&self.url_text, requested_at, elapsed, e),
        }
    }

    fn url(&self) -> &str {
        &self.url_text
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FetchStatus;

    const SAMPLE: &str = r#"{"meta":{"last_updated_at":"2022-10-17T23:59:59Z"},"data":{"EUR":{"code":"EUR","value":1.02}}}"#;

    fn config(url: &str) -> CurrencyApiConfig {
        CurrencyApiConfig::new(url, "API_KEY", Duration::from_secs(3))
    }

    #[test]
    fn test_config_empty_api_key() {
        let cfg = CurrencyApiConfig::new("https://api.example.com/v3/latest", "", Duration::from_secs(3));
        let err = CurrencyApiClient::new(cfg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider configuration error: the API key must not be empty"
        );
    }

    #[test]
    fn test_config_empty_url() {
        let cfg = CurrencyApiConfig::new("", "API_KEY", Duration::from_secs(3));
        let err = CurrencyApiClient::new(cfg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider configuration error: the URL must not be empty"
        );
    }

    #[test]
    fn test_config_zero_timeout() {
        let cfg = CurrencyApiConfig::new("https://api.example.com/v3/latest", "API_KEY", Duration::ZERO);
        let err = CurrencyApiClient::new(cfg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider configuration error: the timeout must not be 0"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = CurrencyApiClient::new(CurrencyApiConfig::new(
            "https://api.example.com/v3/latest",
            "SUPER_SECRET",
            Duration::from_secs(3),
        ))
        .unwrap();
        assert!(!format!("{client:?}").contains("SUPER_SECRET"));
    }

    #[tokio::test]
    async fn test_fetch_success_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v3/latest")
            .match_header("apikey", "API_KEY")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE)
            .create_async()
            .await;

        let url = format!("{}/v3/latest", server.url());
        let client = CurrencyApiClient::new(config(&url)).unwrap();
        let outcome = client.fetch(CancellationToken::new()).await;

        mock.assert_async().await;
        assert_eq!(outcome.metadata.status, FetchStatus::Success);
        assert_eq!(outcome.metadata.url, url);
        assert_eq!(outcome.result.unwrap(), SAMPLE.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v3/latest")
            .with_status(401)
            .with_body(r#"{"message":"Invalid authentication credentials"}"#)
            .create_async()
            .await;

        let client = CurrencyApiClient::new(config(&format!("{}/v3/latest", server.url()))).unwrap();
        let outcome = client.fetch(CancellationToken::new()).await;

        assert_eq!(outcome.metadata.status, FetchStatus::Failure);
        assert!(matches!(outcome.result, Err(ProviderError::Status(401))));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        // 연결은 받지만 응답하지 않는 서버
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = CurrencyApiClient::new(CurrencyApiConfig::new(
            format!("http://{addr}/latest"),
            "API_KEY",
            Duration::from_millis(100),
        ))
        .unwrap();

        let outcome = client.fetch(CancellationToken::new()).await;
        accept.abort();

        assert_eq!(outcome.metadata.status, FetchStatus::Failure);
        assert!(matches!(outcome.result, Err(ProviderError::Timeout(_))));
        assert!(outcome.metadata.elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_fetch_cancelled_token() {
        let client = CurrencyApiClient::new(config("http://127.0.0.1:9/latest")).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = client.fetch(token).await;

        assert_eq!(outcome.metadata.status, FetchStatus::Failure);
        assert!(matches!(outcome.result, Err(ProviderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        // 바인딩 후 즉시 해제한 포트
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client =
            CurrencyApiClient::new(config(&format!("http://127.0.0.1:{port}/latest"))).unwrap();
        let outcome = client.fetch(CancellationToken::new()).await;

        assert_eq!(outcome.metadata.status, FetchStatus::Failure);
        assert!(matches!(outcome.result, Err(ProviderError::Transport(_))));
    }
}
