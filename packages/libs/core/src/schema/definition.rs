//! 테이블 정의
//!
//! SQL 파서가 만들어 내는 CREATE TABLE의 구조화된 설명입니다.
//! 스키마 모델은 이 타입만 받으며, 파서별 AST는 이 경계 밖에 머뭅니다.

use serde::{Deserialize, Serialize};

/// CREATE TABLE 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    /// 테이블 이름
    pub name: String,

    /// 컬럼/제약조건 정의 (선언 순서)
    #[serde(default)]
    pub definitions: Vec<CreateDefinition>,
}

impl TableDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definitions: Vec::new(),
        }
    }

    /// 컬럼 추가
    pub fn column(mut self, column: ColumnDescription) -> Self {
        self.definitions.push(CreateDefinition::Column(column));
        self
    }

    /// 제약조건 추가
    pub fn constraint(mut self, constraint: ConstraintDescription) -> Self {
        self.definitions.push(CreateDefinition::Constraint(constraint));
        self
    }
}

/// 정의 항목 (컬럼 또는 테이블 레벨 제약조건)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateDefinition {
    Column(ColumnDescription),
    Constraint(ConstraintDescription),
}

/// 컬럼 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// 컬럼 이름
    pub name: String,

    /// NULL 허용 여부
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// 컬럼 레벨 `UNIQUE` 또는 `PRIMARY KEY`
    #[serde(default)]
    pub unique_or_primary: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            unique_or_primary: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// 컬럼 레벨 `PRIMARY KEY`
    pub fn primary(mut self) -> Self {
        self.nullable = false;
        self.unique_or_primary = true;
        self
    }

    /// 컬럼 레벨 `UNIQUE`
    pub fn unique(mut self) -> Self {
        self.unique_or_primary = true;
        self
    }
}

/// 테이블 레벨 제약조건
///
/// CHECK 등 탐색에 쓰이지 않는 제약조건은 파서 단계에서 버려집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "constraint_type", rename_all = "snake_case")]
pub enum ConstraintDescription {
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
    },
    ForeignKey {
        /// 이 테이블의 컬럼
        columns: Vec<String>,
        /// 참조 대상 테이블
        foreign_table: String,
        /// 참조 대상 컬럼 (`columns`와 위치로 대응)
        referred_columns: Vec<String>,
    },
}

impl ConstraintDescription {
    pub fn primary_key<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::PrimaryKey {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unique<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::Unique {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn foreign_key<S: Into<String>, R: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        foreign_table: impl Into<String>,
        referred_columns: impl IntoIterator<Item = R>,
    ) -> Self {
        Self::ForeignKey {
            columns: columns.into_iter().map(Into::into).collect(),
            foreign_table: foreign_table.into(),
            referred_columns: referred_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// 제약조건이 포함하는 이 테이블의 컬럼
    pub fn columns(&self) -> &[String] {
        match self {
            Self::PrimaryKey { columns }
            | Self::Unique { columns }
            | Self::ForeignKey { columns, .. } => columns,
        }
    }
}
