//! 테이블 레지스트리
//!
//! 이름으로 테이블을 찾는 저장소입니다. 탐색 중에는 읽기 전용으로만 쓰입니다.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use super::table::Table;
use crate::error::{Error, Result};

/// 테이블 레지스트리
///
/// 이름 순으로 정렬되어 있어 순회 결과가 결정적입니다.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<Table>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 테이블 등록
    ///
    /// 같은 이름이 이미 있으면 `DuplicateTable` 에러를 돌려주고 기존 항목은 그대로 둡니다.
    pub fn register(&mut self, table: Table) -> Result<Arc<Table>> {
        if self.tables.contains_key(table.name()) {
            return Err(Error::DuplicateTable {
                name: table.name().to_string(),
            });
        }

        let table = Arc::new(table);
        self.tables.insert(table.name().to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// 테이블 조회
    pub fn get(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.get(name)
    }

    /// 테이블 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// 모든 테이블 (이름 순)
    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.tables.values()
    }

    /// 모든 테이블 이름 (이름 순)
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// 외래키 참조 검증
    ///
    /// 등록되지 않은 테이블을 참조하는 외래키를 모두 찾습니다.
    /// 이런 참조는 탐색 중 `UnknownTable` 에러가 됩니다.
    pub fn validate_references(&self) -> Vec<ReferenceError> {
        let mut errors = Vec::new();

        for table in self.tables.values() {
            for reference in table.foreign_key_refs() {
                if !self.tables.contains_key(&reference.referenced_table) {
                    errors.push(ReferenceError::TableNotFound {
                        from_table: table.name().to_string(),
                        from_columns: reference.internal_columns.clone(),
                        ref_table: reference.referenced_table.clone(),
                    });
                }
            }
        }

        errors
    }

    /// 참조 대상이 먼저 오는 테이블 순서 (Kahn 위상 정렬)
    ///
    /// 등록되지 않은 참조와 자기 참조는 무시합니다.
    /// 순환에 속한 테이블은 마지막에 이름 순으로 붙습니다.
    pub fn creation_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, table) in &self.tables {
            let mut required: Vec<&str> = table
                .required_table_names()
                .iter()
                .map(|s| s.as_str())
                .filter(|dep| *dep != name.as_str() && self.tables.contains_key(*dep))
                .collect();
            required.sort_unstable();
            required.dedup();

            in_degree.insert(name.as_str(), required.len());
            for dep in required {
                dependents.entry(dep).or_default().push(name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .tables
            .keys()
            .map(|s| s.as_str())
            .filter(|name| in_degree.get(name).copied() == Some(0))
            .collect();

        let mut order = Vec::with_capacity(self.tables.len());
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());

            if let Some(children) = dependents.get(name) {
                for child in children {
                    if let Some(degree) = in_degree.get_mut(child) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(*child);
                        }
                    }
                }
            }
        }

        if order.len() < self.tables.len() {
            for name in self.tables.keys() {
                if in_degree.get(name.as_str()).copied().unwrap_or(0) > 0 {
                    order.push(name.clone());
                }
            }
        }

        order
    }
}

/// 참조 검증 에러
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    TableNotFound {
        from_table: String,
        from_columns: Vec<String>,
        ref_table: String,
    },
}

impl std::fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceError::TableNotFound {
                from_table,
                from_columns,
                ref_table,
            } => write!(
                f,
                "table '{}' ({}) references unknown table '{}'",
                from_table,
                from_columns.join(", "),
                ref_table
            ),
        }
    }
}
