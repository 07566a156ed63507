//! API 에러 응답 타입.
//!
//! 모든 엔드포인트가 같은 JSON 에러 형식을 사용합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API 에러 응답.
///
/// ```json
/// {
///   "code": "INVALID_CURRENCY",
///   "message": "bad route parameter (currency) with value (US). it must contain only 3 letters",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CURRENCY", "INVALID_DATETIME", "DB_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

// ==================== 응답 변환 ====================

/// 상태 코드와 에러 본문 쌍.
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// 핸들러 결과 타입.
pub type ApiResult<T> = Result<T, ApiError>;

/// 400 Bad Request
pub fn bad_request(error: ApiErrorResponse) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error))
}

/// 500 Internal Server Error
pub fn internal_error(error: ApiErrorResponse) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error))
}

impl From<currency_data::DataError> for ApiErrorResponse {
    fn from(err: currency_data::DataError) -> Self {
        Self::new("DB_ERROR", err.to_string())
    }
}
