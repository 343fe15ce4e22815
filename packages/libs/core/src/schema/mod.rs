//! 스키마 모델
//!
//! # 개요
//!
//! 테이블 정의(CREATE TABLE)는 SQL 어댑터가 [`TableDescription`]으로 변환해 넘겨줍니다.
//! 이 모듈은 그 설명으로부터 탐색에 필요한 정보를 계산합니다.
//!
//! # 모듈 구조
//!
//! - `definition`: 파서 경계 타입 (컬럼/제약조건 설명)
//! - `table`: 테이블 스키마 (식별 키, 외래키 참조)
//! - `identity`: 행 식별자 인코딩
//! - `registry`: 이름 → 테이블 레지스트리

mod definition;
mod identity;
mod registry;
mod table;

pub use definition::{ColumnDescription, ConstraintDescription, CreateDefinition, TableDescription};
pub use identity::{encode_identity, MAX_PLAIN_IDENTITY_LEN};
pub use registry::{ReferenceError, TableRegistry};
pub use table::{IdentityKey, Table, TableReference};
