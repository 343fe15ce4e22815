//! 지원 DB 종류

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{Dialect, MySqlDialect, SQLiteDialect};

use crate::error::{Result, SqlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Sqlite,
    MySql,
}

impl Engine {
    /// 연결 URL의 scheme으로 판별 (`sqlite:`, `mysql:`, `mariadb:`)
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(Engine::Sqlite),
            "mysql" | "mariadb" => Ok(Engine::MySql),
            _ => Err(SqlError::UnsupportedEngine {
                url: redact(url),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Engine::Sqlite => "sqlite",
            Engine::MySql => "mysql",
        }
    }

    /// DDL 파싱용 SQL 방언
    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            Engine::Sqlite => Box::new(SQLiteDialect {}),
            Engine::MySql => Box::new(MySqlDialect {}),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 에러 메시지에 비밀번호가 남지 않도록 userinfo 제거
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(start), Some(at)) if at > start => format!("{}://***@{}", &url[..start], &url[at + 1..]),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(Engine::from_url("sqlite::memory:").unwrap(), Engine::Sqlite);
        assert_eq!(Engine::from_url("sqlite://data.db").unwrap(), Engine::Sqlite);
        assert_eq!(Engine::from_url("mysql://root@localhost/db").unwrap(), Engine::MySql);
        assert_eq!(Engine::from_url("MariaDB://root@localhost/db").unwrap(), Engine::MySql);
    }

    #[test]
    fn test_unsupported_url_is_redacted() {
        let err = Engine::from_url("postgres://admin:hunter2@db/app").unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_ENGINE");
        assert!(!err.to_string().contains("hunter2"));
        assert!(err.to_string().contains("postgres://***@db/app"));
    }
}
