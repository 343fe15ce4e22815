//! 행 조회 소스
//!
//! 탐색 로직은 [`DataSource`]를 통해서만 데이터를 읽습니다.
//! SQL 구현은 `subset-sql`에 있고, 여기에는 픽스처용 인메모리 구현이 있습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::WhereClause;
use crate::row::RowData;

/// 행 조회 trait
///
/// 여러 조회가 동시에 호출될 수 있습니다.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// `filter`를 만족하는 행을 조회합니다. 빈 조건은 전체 스캔입니다.
    async fn select(&self, table_name: &str, filter: &WhereClause) -> Result<Vec<RowData>>;
}

/// 인메모리 데이터 소스
///
/// 테이블 이름 → 행 목록. 조회 횟수를 기록합니다.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<RowData>>,
    lookups: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{ "TABLE": [ {row}, ... ], ... }` 형식의 JSON 스냅샷에서 생성
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tables: HashMap<String, Vec<RowData>> = serde_json::from_str(json)?;
        Ok(Self {
            tables,
            lookups: AtomicUsize::new(0),
        })
    }

    /// 테이블에 행 추가 (테이블이 없으면 생성)
    pub fn insert(&mut self, table_name: impl Into<String>, rows: impl IntoIterator<Item = RowData>) {
        self.tables.entry(table_name.into()).or_default().extend(rows);
    }

    pub fn with_rows(mut self, table_name: impl Into<String>, rows: Vec<Value>) -> Self {
        let rows = rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        });
        self.insert(table_name, rows);
        self
    }

    /// 지금까지 처리한 조회 수
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn select(&self, table_name: &str, filter: &WhereClause) -> Result<Vec<RowData>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let rows = self
            .tables
            .get(table_name)
            .ok_or_else(|| Error::data_source(table_name, format!("no such table: {}", table_name)))?;

        Ok(rows.iter().filter(|row| filter.matches(row)).cloned().collect())
    }
}
