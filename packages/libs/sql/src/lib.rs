//! subset-sql: SQL 데이터베이스 어댑터
//!
//! `subset-core`의 스키마 모델과 탐색 로직을 실제 DB에 연결합니다.
//! SeaQuery로 조회 SQL을 만들고, sqlparser로 CREATE TABLE을 해석하며, sqlx로 실행합니다.
//!
//! # 모듈 구조
//!
//! - `engine`: 지원 DB 종류 (SQLite, MySQL/MariaDB)
//! - `ddl`: CREATE TABLE 텍스트 → `TableDescription`
//! - `builder`: 링크 조회용 SELECT 빌더
//! - `source`: sqlx 풀 기반 `DataSource`
//! - `value`: 바이너리 컬럼 값의 JSON 표현
//! - `trigger`: 트리거 정의와 덤프용 SQL
//! - `lock`: MySQL 이름 잠금 (`GET_LOCK` / `RELEASE_LOCK`)
//! - `database`: 위 모듈을 묶은 파사드

pub mod builder;
pub mod database;
pub mod ddl;
pub mod engine;
pub mod error;
pub mod lock;
pub mod source;
pub mod trigger;
pub mod value;

pub use builder::SelectBuilder;
pub use database::{ConnectOptions, Database};
pub use ddl::parse_table_definition;
pub use engine::Engine;
pub use error::{Result, SqlError};
pub use source::SqlSource;
pub use trigger::Trigger;
pub use value::{bytes_from_json, bytes_to_json, BYTES_KEY};
