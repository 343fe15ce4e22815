//! SQL 어댑터 에러 타입

pub type Result<T> = std::result::Result<T, SqlError>;

/// SQL 어댑터 에러
#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("core error: {0}")]
    Core(#[from] subset_core::Error),

    #[error("unsupported database url: {url}")]
    UnsupportedEngine { url: String },

    #[error("{operation} is not supported on {engine}")]
    Unsupported {
        operation: &'static str,
        engine: &'static str,
    },

    #[error("could not acquire named lock '{name}'")]
    LockNotAcquired { name: String },

    #[error("cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl SqlError {
    /// 에러 코드 (CLI 출력용)
    pub fn code(&self) -> &'static str {
        match self {
            SqlError::Database(_) => "DATABASE_ERROR",
            SqlError::Core(e) => e.code(),
            SqlError::UnsupportedEngine { .. } => "UNSUPPORTED_ENGINE",
            SqlError::Unsupported { .. } => "UNSUPPORTED_OPERATION",
            SqlError::LockNotAcquired { .. } => "LOCK_NOT_ACQUIRED",
            SqlError::Decode { .. } => "DECODE_ERROR",
        }
    }
}
