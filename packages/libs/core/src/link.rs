//! 행 링크 계산
//!
//! 링크는 "테이블 T에서 조건 W를 만족하는 행"이라는 조회 요청입니다.
//!
//! - 상향 링크: 이 행의 외래키가 가리키는 행 (`참조 컬럼 → 이 행의 로컬 값`)
//! - 하향 링크: 다른 테이블에서 이 행을 가리키는 행 (`그 테이블의 로컬 컬럼 → 이 행의 참조 값`)
//!
//! 행에 없는 컬럼 값은 null로 취급하므로 해당 링크는 `has_null()`이 됩니다.

use serde::Serialize;

use crate::filter::WhereClause;
use crate::row::Row;
use crate::schema::Table;

/// 행 링크
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowLink {
    /// 조회 대상 테이블
    pub table_name: String,

    /// 조회 조건
    pub filter: WhereClause,
}

impl RowLink {
    pub fn new(table_name: impl Into<String>, filter: WhereClause) -> Self {
        Self {
            table_name: table_name.into(),
            filter,
        }
    }

    /// 조건 값 중 하나라도 null인지
    ///
    /// null 링크는 어떤 행과도 이어지지 않으므로 탐색에서 제외됩니다.
    pub fn has_null(&self) -> bool {
        self.filter.has_null()
    }
}

/// 상향 링크: 이 행의 외래키마다 하나씩 (선언 순서)
pub fn links_up(row: &Row) -> Vec<RowLink> {
    row.table()
        .foreign_key_refs()
        .iter()
        .map(|reference| {
            let filter = reference
                .referenced_columns
                .iter()
                .zip(&reference.internal_columns)
                .map(|(referenced, internal)| (referenced.clone(), row.value(internal)))
                .collect();
            RowLink::new(reference.referenced_table.clone(), filter)
        })
        .collect()
}

/// 하향 링크: 주어진 테이블의 외래키 중 이 행의 테이블을 가리키는 것마다 하나씩
pub fn links_down<'a>(row: &Row, tables: impl IntoIterator<Item = &'a Table>) -> Vec<RowLink> {
    let mut links = Vec::new();

    for table in tables {
        for reference in table.foreign_key_refs() {
            if reference.referenced_table != row.table_name() {
                continue;
            }

            let filter = reference
                .internal_columns
                .iter()
                .zip(&reference.referenced_columns)
                .map(|(internal, referenced)| (internal.clone(), row.value(referenced)))
                .collect();
            links.push(RowLink::new(table.name(), filter));
        }
    }

    links
}

/// 탐색에 쓰이는 링크 (상향 전체, `travel_down`이면 하향 추가)
pub fn compute_links<'a>(
    row: &Row,
    travel_down: bool,
    known_tables: impl IntoIterator<Item = &'a Table>,
) -> Vec<RowLink> {
    let mut links = links_up(row);
    if travel_down {
        links.extend(links_down(row, known_tables));
    }
    links
}
