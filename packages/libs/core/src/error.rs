//! 공통 에러 타입
//!
//! subset 전체에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 데이터 소스가 돌려주는 임의의 에러
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// subset 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("schema parse error: {message}")]
    SchemaParse { message: String },

    #[error("duplicate table name: {name}")]
    DuplicateTable { name: String },

    #[error("duplicate trigger name: {name}")]
    DuplicateTrigger { name: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Traversal Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unknown table name referenced in row: '{name}'")]
    UnknownTable { name: String },

    #[error("data source error while reading '{table}': {source}")]
    DataSource {
        table: String,
        #[source]
        source: BoxError,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 데이터 소스 에러 래핑
    pub fn data_source(table: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::DataSource {
            table: table.into(),
            source: source.into(),
        }
    }

    /// 에러 코드 (CLI 출력용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaParse { .. } => "SCHEMA_PARSE_ERROR",
            Error::DuplicateTable { .. } => "DUPLICATE_TABLE",
            Error::DuplicateTrigger { .. } => "DUPLICATE_TRIGGER",
            Error::UnknownTable { .. } => "UNKNOWN_TABLE",
            Error::DataSource { .. } => "DATA_SOURCE_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}

/// 스키마 모델 생성 시 발생하는 경고
///
/// 에러와 달리 테이블 생성을 막지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaWarning {
    #[error("Unable to locate suitably unique index in table '{table}'. Duplicates may appear.")]
    AmbiguousIdentity { table: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::UnknownTable {
            name: "FAKE_TABLE".to_string(),
        };
        assert_eq!(err.code(), "UNKNOWN_TABLE");
        assert!(err.to_string().contains("FAKE_TABLE"));

        let err = Error::data_source("USERS", "connection reset");
        assert_eq!(err.code(), "DATA_SOURCE_ERROR");
        assert_eq!(
            err.to_string(),
            "data source error while reading 'USERS': connection reset"
        );
    }

    #[test]
    fn test_warning_message() {
        let warning = SchemaWarning::AmbiguousIdentity {
            table: "LOGS".to_string(),
        };
        assert!(warning.to_string().starts_with("Unable to locate suitably unique index"));
        assert!(warning.to_string().contains("LOGS"));
    }
}
