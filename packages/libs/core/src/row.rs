//! 조회된 단일 행
//!
//! 행은 소속 테이블, 행 식별자, 컬럼 값을 가집니다.
//! 식별자는 생성 시점에 한 번 계산되고 이후 바뀌지 않습니다.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::link::{self, RowLink};
use crate::schema::Table;

/// 컬럼 이름 → 값 (조회 결과의 컬럼 순서 유지)
pub type RowData = serde_json::Map<String, Value>;

/// 단일 행
#[derive(Debug, Clone)]
pub struct Row {
    table: Arc<Table>,
    id: String,
    data: RowData,
}

impl Row {
    /// 식별자를 직접 지정해 생성
    pub fn new(table: Arc<Table>, id: impl Into<String>, data: RowData) -> Self {
        Self {
            table,
            id: id.into(),
            data,
        }
    }

    /// 테이블의 식별 컬럼으로 식별자를 계산해 생성
    pub fn from_data(table: Arc<Table>, data: RowData) -> Self {
        let id = table.row_identity(&data);
        Self { table, id, data }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// 행 식별자 (같은 테이블 안에서만 의미가 있음)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &RowData {
        &self.data
    }

    /// 컬럼 값 (없으면 `None`)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    /// 컬럼 값 (없으면 null)
    pub fn value(&self, column: &str) -> Value {
        self.data.get(column).cloned().unwrap_or(Value::Null)
    }

    pub fn into_data(self) -> RowData {
        self.data
    }

    /// 이 행이 참조하는 행으로의 링크
    pub fn links_up(&self) -> Vec<RowLink> {
        link::links_up(self)
    }

    /// 주어진 테이블 중 이 행을 참조하는 행으로의 링크
    pub fn links_down<'a>(&self, tables: impl IntoIterator<Item = &'a Table>) -> Vec<RowLink> {
        link::links_down(self, tables)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}
