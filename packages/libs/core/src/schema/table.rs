//! 스키마 모델
//!
//! 테이블 설명으로부터 외래키 참조, 식별 컬럼, 의존 테이블 목록을 한 번에 계산합니다.
//! 생성 이후에는 변경되지 않습니다.

use serde::Serialize;
use tracing::warn;

use super::definition::{ColumnDescription, ConstraintDescription, CreateDefinition, TableDescription};
use super::identity::encode_identity;
use crate::error::SchemaWarning;
use crate::row::RowData;

/// 외래키 참조
///
/// `internal_table`의 `internal_columns[i]`가 `referenced_table`의
/// `referenced_columns[i]`를 가리킵니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReference {
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub internal_table: String,
    pub internal_columns: Vec<String>,
}

/// 행 식별에 사용되는 키
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "columns", rename_all = "snake_case")]
pub enum IdentityKey {
    /// 기본키
    Primary(Vec<String>),
    /// 가장 작은 유니크 제약조건
    Unique(Vec<String>),
    /// 식별 불가 (행이 중복 제거되지 않음)
    Missing,
}

impl IdentityKey {
    pub fn columns(&self) -> &[String] {
        match self {
            IdentityKey::Primary(columns) | IdentityKey::Unique(columns) => columns,
            IdentityKey::Missing => &[],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdentityKey::Primary(_) => "primary",
            IdentityKey::Unique(_) => "unique",
            IdentityKey::Missing => "none",
        }
    }
}

/// 테이블 스키마
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<ColumnDescription>,
    constraints: Vec<ConstraintDescription>,
    foreign_key_refs: Vec<TableReference>,
    required_table_names: Vec<String>,
    identity_key: IdentityKey,
    warning: Option<SchemaWarning>,
}

impl Table {
    /// 테이블 설명으로부터 생성
    ///
    /// 식별 키를 찾지 못하면 경고를 기록하고 `warning()`으로 노출합니다.
    pub fn new(description: TableDescription) -> Self {
        let TableDescription { name, definitions } = description;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        for definition in definitions {
            match definition {
                CreateDefinition::Column(column) => columns.push(column),
                CreateDefinition::Constraint(constraint) => constraints.push(constraint),
            }
        }

        let foreign_key_refs = collect_foreign_keys(&name, &constraints);
        let required_table_names = foreign_key_refs
            .iter()
            .map(|reference| reference.referenced_table.clone())
            .collect();

        let identity_key = match find_primary_key(&columns, &constraints) {
            Some(columns) => IdentityKey::Primary(columns),
            None => match find_smallest_unique(&constraints) {
                Some(columns) => IdentityKey::Unique(columns),
                None => IdentityKey::Missing,
            },
        };

        let warning = match identity_key {
            IdentityKey::Missing => {
                let warning = SchemaWarning::AmbiguousIdentity { table: name.clone() };
                warn!("{}", warning);
                Some(warning)
            }
            _ => None,
        };

        Self {
            name,
            columns,
            constraints,
            foreign_key_refs,
            required_table_names,
            identity_key,
            warning,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDescription] {
        &self.columns
    }

    pub fn constraints(&self) -> &[ConstraintDescription] {
        &self.constraints
    }

    /// 컬럼 존재 여부
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// 컬럼 이름 (선언 순서)
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// 이 테이블의 외래키 참조 (선언 순서)
    pub fn foreign_key_refs(&self) -> &[TableReference] {
        &self.foreign_key_refs
    }

    /// 외래키가 참조하는 테이블 이름 (중복 포함, 선언 순서)
    pub fn required_table_names(&self) -> &[String] {
        &self.required_table_names
    }

    /// 기본키 컬럼
    pub fn primary_key(&self) -> Option<&[String]> {
        match &self.identity_key {
            IdentityKey::Primary(columns) => Some(columns),
            _ => None,
        }
    }

    pub fn identity_key(&self) -> &IdentityKey {
        &self.identity_key
    }

    /// 행 식별에 사용되는 컬럼 (없으면 빈 슬라이스)
    pub fn identity_columns(&self) -> &[String] {
        self.identity_key.columns()
    }

    pub fn warning(&self) -> Option<&SchemaWarning> {
        self.warning.as_ref()
    }

    /// 행 데이터의 식별자 계산
    pub fn row_identity(&self, data: &RowData) -> String {
        encode_identity(self.identity_columns(), data)
    }
}

impl From<TableDescription> for Table {
    fn from(description: TableDescription) -> Self {
        Self::new(description)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Key Selection
// ─────────────────────────────────────────────────────────────────────────────

fn collect_foreign_keys(table: &str, constraints: &[ConstraintDescription]) -> Vec<TableReference> {
    constraints
        .iter()
        .filter_map(|constraint| match constraint {
            ConstraintDescription::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
            } => {
                if columns.is_empty() || columns.len() != referred_columns.len() {
                    warn!(
                        table,
                        foreign_table = foreign_table.as_str(),
                        "ignoring foreign key without an explicit column mapping"
                    );
                    return None;
                }
                Some(TableReference {
                    referenced_table: foreign_table.clone(),
                    referenced_columns: referred_columns.clone(),
                    internal_table: table.to_string(),
                    internal_columns: columns.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// 컬럼 레벨 PRIMARY KEY/UNIQUE가 우선, 없으면 PRIMARY KEY 제약조건
fn find_primary_key(
    columns: &[ColumnDescription],
    constraints: &[ConstraintDescription],
) -> Option<Vec<String>> {
    if let Some(column) = columns.iter().find(|c| c.unique_or_primary) {
        return Some(vec![column.name.clone()]);
    }

    constraints.iter().find_map(|constraint| match constraint {
        ConstraintDescription::PrimaryKey { columns: keys }
            if !keys.is_empty()
                && keys.iter().all(|key| columns.iter().any(|c| &c.name == key)) =>
        {
            Some(keys.clone())
        }
        _ => None,
    })
}

/// 컬럼 수가 가장 적은 UNIQUE 제약조건 (동률이면 먼저 선언된 것)
fn find_smallest_unique(constraints: &[ConstraintDescription]) -> Option<Vec<String>> {
    constraints
        .iter()
        .filter_map(|constraint| match constraint {
            ConstraintDescription::Unique { columns } if !columns.is_empty() => Some(columns),
            _ => None,
        })
        .min_by_key(|columns| columns.len())
        .cloned()
}
