//! subset-core: 참조 무결성 부분집합 추출의 핵심 라이브러리
//!
//! 이 크레이트는 SQL 어댑터와 CLI가 공유하는 스키마 모델과 탐색 로직을 제공합니다.
//! DB 드라이버에는 의존하지 않으며, 조회는 [`DataSource`] trait을 통해 주입됩니다.
//!
//! # 모듈 구조
//!
//! - `schema`: 테이블 정의 → 스키마 모델 (식별 컬럼, 외래키, 레지스트리)
//! - `row`: 조회된 단일 행과 행 식별자
//! - `filter`: 등치 조건 맵 (`WhereClause`)
//! - `link`: 외래키 기반 행 링크 계산 (상향/하향)
//! - `source`: 행 조회 trait 및 인메모리 구현
//! - `closure`: 의존성 클로저 탐색
//! - `error`: 공통 에러 타입

pub mod closure;
pub mod error;
pub mod filter;
pub mod link;
pub mod row;
pub mod schema;
pub mod source;

pub use closure::{fetch_rows, find_dependency_closure, Closure, ClosureResolver};
pub use error::{Error, Result, SchemaWarning};
pub use filter::{WhereClause, WhereValidationError};
pub use link::RowLink;
pub use row::{Row, RowData};
pub use schema::{Table, TableRegistry};
pub use source::{DataSource, MemorySource};
