//! sqlx 풀 기반 데이터 소스
//!
//! 링크 조회를 SQL로 실행하고 결과 행을 JSON 값으로 변환합니다.
//! 카탈로그 조회(테이블/트리거 정의)도 여기서 담당합니다.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Number, Value};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use subset_core::{DataSource, RowData, WhereClause};

use crate::builder::SelectBuilder;
use crate::engine::Engine;
use crate::error::{Result, SqlError};
use crate::value::bytes_to_json;

/// 연결 풀
#[derive(Debug, Clone)]
pub enum SqlSource {
    Sqlite(SqlitePool),
    MySql(MySqlPool),
}

impl SqlSource {
    pub fn engine(&self) -> Engine {
        match self {
            SqlSource::Sqlite(_) => Engine::Sqlite,
            SqlSource::MySql(_) => Engine::MySql,
        }
    }

    /// SQL 실행 후 행을 JSON 맵으로 변환
    pub async fn query_rows(&self, sql: &str) -> Result<Vec<RowData>> {
        let rows = match self {
            SqlSource::Sqlite(pool) => sqlx::query(sql)
                .fetch_all(pool)
                .await?
                .iter()
                .map(sqlite_row_to_json)
                .collect::<Result<Vec<_>>>()?,
            SqlSource::MySql(pool) => sqlx::query(sql)
                .fetch_all(pool)
                .await?
                .iter()
                .map(mysql_row_to_json)
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(rows)
    }

    /// 사용자 테이블의 `(이름, CREATE TABLE 문)` 목록 (이름 순)
    ///
    /// SQLite의 가상 테이블(FTS5, R-tree 등)과 그 shadow 테이블은 제외합니다.
    pub async fn table_definitions(&self) -> Result<Vec<(String, String)>> {
        match self {
            SqlSource::Sqlite(pool) => {
                let rows: Vec<(String, Option<String>)> = sqlx::query_as(
                    "SELECT name, sql FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                     AND sql NOT LIKE 'CREATE VIRTUAL TABLE%' \
                     AND name NOT IN (SELECT name FROM pragma_table_list \
                                      WHERE schema = 'main' AND type IN ('virtual', 'shadow')) \
                     ORDER BY name",
                )
                .fetch_all(pool)
                .await?;
                Ok(rows
                    .into_iter()
                    .filter_map(|(name, sql)| sql.map(|sql| (name, sql)))
                    .collect())
            }
            SqlSource::MySql(pool) => {
                let names: Vec<String> = sqlx::query_scalar(
                    "SELECT table_name AS name FROM information_schema.tables \
                     WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name",
                )
                .fetch_all(pool)
                .await?;

                try_join_all(names.into_iter().map(|name| async move {
                    let row = sqlx::query(&format!("SHOW CREATE TABLE {}", quote_mysql(&name)))
                        .fetch_one(pool)
                        .await?;
                    let sql: String = row.try_get("Create Table")?;
                    Ok::<_, SqlError>((name, sql))
                }))
                .await
            }
        }
    }

    /// 트리거의 `(이름, CREATE TRIGGER 문)` 목록
    pub async fn trigger_definitions(&self) -> Result<Vec<(String, String)>> {
        match self {
            SqlSource::Sqlite(pool) => {
                let rows: Vec<(String, Option<String>)> = sqlx::query_as(
                    "SELECT name, sql FROM sqlite_master WHERE type = 'trigger' ORDER BY name",
                )
                .fetch_all(pool)
                .await?;
                Ok(rows
                    .into_iter()
                    .filter_map(|(name, sql)| sql.map(|sql| (name, sql)))
                    .collect())
            }
            SqlSource::MySql(pool) => {
                let rows = sqlx::query("SHOW TRIGGERS").fetch_all(pool).await?;
                let names = rows
                    .iter()
                    .map(|row| row.try_get::<String, _>("Trigger"))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                try_join_all(names.into_iter().map(|name| async move {
                    let row = sqlx::query(&format!("SHOW CREATE TRIGGER {}", quote_mysql(&name)))
                        .fetch_one(pool)
                        .await?;
                    let sql: String = row.try_get("SQL Original Statement")?;
                    Ok::<_, SqlError>((name, sql))
                }))
                .await
            }
        }
    }

    /// 풀 종료
    pub async fn close(&self) {
        match self {
            SqlSource::Sqlite(pool) => pool.close().await,
            SqlSource::MySql(pool) => pool.close().await,
        }
    }
}

#[async_trait]
impl DataSource for SqlSource {
    async fn select(&self, table_name: &str, filter: &WhereClause) -> subset_core::Result<Vec<RowData>> {
        let sql = SelectBuilder::new(table_name).build(filter, self.engine());
        debug!(%sql, "select");

        self.query_rows(&sql)
            .await
            .map_err(|e| subset_core::Error::data_source(table_name, e))
    }
}

fn quote_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite는 값마다 저장 타입이 다르므로 선언 타입이 아닌 실제 값의 타입으로 변환
///
/// 값을 읽지 못하면 null로 바꾸지 않고 에러를 냅니다. null은 링크를 끊기 때문입니다.
fn sqlite_row_to_json(row: &SqliteRow) -> Result<RowData> {
    let mut obj = RowData::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let type_name = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                obj.insert(name.to_string(), Value::Null);
                continue;
            }
            raw.type_info().name().to_ascii_uppercase()
        };

        let value = match type_name.as_str() {
            "INTEGER" | "INT8" | "BIGINT" => Value::Number(row.try_get::<i64, _>(idx)?.into()),
            "REAL" | "FLOAT" | "DOUBLE" => float_to_json(name, row.try_get::<f64, _>(idx)?)?,
            "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
            "BLOB" => bytes_to_json(&row.try_get::<Vec<u8>, _>(idx)?),
            _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        };

        obj.insert(name.to_string(), value);
    }
    Ok(obj)
}

fn mysql_row_to_json(row: &MySqlRow) -> Result<RowData> {
    let mut obj = RowData::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        if row.try_get_raw(idx)?.is_null() {
            obj.insert(name.to_string(), Value::Null);
            continue;
        }

        let type_name = column.type_info().name().to_ascii_uppercase();
        let value = match type_name.as_str() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                Value::Number(row.try_get::<i64, _>(idx)?.into())
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => Value::Number(row.try_get::<u64, _>(idx)?.into()),
            "FLOAT" => float_to_json(name, f64::from(row.try_get::<f32, _>(idx)?))?,
            "DOUBLE" => float_to_json(name, row.try_get::<f64, _>(idx)?)?,
            "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
            "JSON" => row.try_get::<Value, _>(idx)?,
            "DATETIME" => Value::String(row.try_get::<chrono::NaiveDateTime, _>(idx)?.to_string()),
            "TIMESTAMP" => Value::String(
                row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?
                    .to_rfc3339(),
            ),
            "DATE" => Value::String(row.try_get::<chrono::NaiveDate, _>(idx)?.to_string()),
            // 음수와 24시간 이상도 표현 가능한 타입으로 읽음
            "TIME" => Value::String(row.try_get::<MySqlTime, _>(idx)?.to_string()),
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
                bytes_to_json(&row.try_get_unchecked::<Vec<u8>, _>(idx)?)
            }
            // DECIMAL, CHAR, ENUM 등은 텍스트 표현 그대로
            _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        };

        obj.insert(name.to_string(), value);
    }
    Ok(obj)
}

fn float_to_json(column: &str, value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| SqlError::Decode {
            column: column.to_string(),
            message: format!("non-finite float {}", value),
        })
}
