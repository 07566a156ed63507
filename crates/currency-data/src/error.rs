//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),
}

impl DataError {
    /// 삽입 실패를 문맥과 함께 감쌉니다.
    ///
    /// 고유 제약 조건 위반은 `DuplicateError`로 유지합니다.
    pub(crate) fn insert(context: &str, err: sqlx::Error) -> Self {
        match DataError::from(err) {
            DataError::DuplicateError(msg) => DataError::DuplicateError(format!("{context}: {msg}")),
            other => DataError::InsertError(format!("{context}: {other}")),
        }
    }

    /// 조회 실패를 문맥과 함께 감쌉니다.
    pub(crate) fn query(context: &str, err: sqlx::Error) -> Self {
        DataError::QueryError(format!("{context}: {err}"))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    DataError::DuplicateError(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DataError::MigrationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
