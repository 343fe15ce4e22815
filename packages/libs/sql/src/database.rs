//! 데이터베이스 파사드
//!
//! 연결 풀, 테이블 레지스트리, 트리거 목록, 이름 잠금을 하나로 묶습니다.
//!
//! ```ignore
//! let mut db = Database::connect("sqlite://data.db", &ConnectOptions::default()).await?;
//! db.load_all().await?;
//! let seeds = db.select("USERS", &WhereClause::empty().eq("id", 1)).await?;
//! let closure = db.find_tree(seeds, true).await?;
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};

use subset_core::{fetch_rows, Closure, ClosureResolver, Row, Table, TableRegistry, WhereClause};

use crate::ddl::parse_table_definition;
use crate::engine::Engine;
use crate::error::{Result, SqlError};
use crate::lock::NamedLocks;
use crate::source::SqlSource;
use crate::trigger::Trigger;

/// 연결 옵션
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// 풀 최대 연결 수
    pub max_connections: u32,

    /// 탐색 중 동시 조회 수 제한 (None = 제한 없음)
    pub max_concurrent_lookups: Option<usize>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            max_concurrent_lookups: None,
        }
    }
}

/// 데이터베이스
pub struct Database {
    source: SqlSource,
    registry: TableRegistry,
    triggers: BTreeMap<String, Trigger>,
    locks: NamedLocks,
    max_concurrent_lookups: Option<usize>,
}

impl Database {
    /// URL로 연결 (`sqlite:`, `mysql:`, `mariadb:`)
    pub async fn connect(url: &str, options: &ConnectOptions) -> Result<Self> {
        let source = match Engine::from_url(url)? {
            Engine::Sqlite => SqlSource::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(options.max_connections)
                    .connect(url)
                    .await?,
            ),
            Engine::MySql => SqlSource::MySql(
                MySqlPoolOptions::new()
                    .max_connections(options.max_connections)
                    .connect(url)
                    .await?,
            ),
        };

        info!(engine = %source.engine(), "connected to database");
        let mut db = Self::from_source(source);
        db.max_concurrent_lookups = options.max_concurrent_lookups;
        Ok(db)
    }

    /// 이미 만든 풀로 생성
    pub fn from_source(source: SqlSource) -> Self {
        Self {
            source,
            registry: TableRegistry::new(),
            triggers: BTreeMap::new(),
            locks: NamedLocks::new(),
            max_concurrent_lookups: None,
        }
    }

    pub fn engine(&self) -> Engine {
        self.source.engine()
    }

    pub fn source(&self) -> &SqlSource {
        &self.source
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.registry.get(name)
    }

    pub fn set_max_concurrent_lookups(&mut self, limit: Option<usize>) {
        self.max_concurrent_lookups = limit;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tables
    // ─────────────────────────────────────────────────────────────────────────

    /// 테이블과 트리거를 모두 로드
    pub async fn load_all(&mut self) -> Result<()> {
        let (tables, triggers) = futures::try_join!(
            self.source.table_definitions(),
            self.source.trigger_definitions()
        )?;

        self.register_tables(tables)?;
        self.register_triggers(triggers)?;
        Ok(())
    }

    /// DB 카탈로그에서 테이블 정의를 읽어 등록
    ///
    /// 반환값은 새로 등록된 테이블 수입니다.
    pub async fn load_tables(&mut self) -> Result<usize> {
        let tables = self.source.table_definitions().await?;
        self.register_tables(tables)
    }

    fn register_tables(&mut self, tables: Vec<(String, String)>) -> Result<usize> {
        let count = tables.len();
        for (name, sql) in tables {
            let table = self.add_table_sql(&sql)?;
            if table.name() != name {
                warn!(catalog = %name, parsed = table.name(), "table name differs from catalog entry");
            }
        }

        let missing = self.registry.validate_references();
        for error in &missing {
            warn!("{}", error);
        }

        info!(tables = count, "tables loaded");
        Ok(count)
    }

    /// 테이블 등록 (같은 이름이 있으면 `DuplicateTable`)
    pub fn add_table(&mut self, table: Table) -> Result<Arc<Table>> {
        Ok(self.registry.register(table)?)
    }

    /// CREATE TABLE 문을 해석해 등록
    pub fn add_table_sql(&mut self, sql: &str) -> Result<Arc<Table>> {
        let description = parse_table_definition(sql, self.engine())?;
        self.add_table(Table::new(description))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rows
    // ─────────────────────────────────────────────────────────────────────────

    /// 등록된 테이블에서 조건에 맞는 행 조회 (빈 조건은 전체)
    pub async fn select(&self, table_name: &str, filter: &WhereClause) -> Result<Vec<Row>> {
        let table = self
            .registry
            .get(table_name)
            .ok_or_else(|| subset_core::Error::UnknownTable {
                name: table_name.to_string(),
            })?;

        Ok(fetch_rows(table, filter, &self.source).await?)
    }

    /// 시드 행들의 의존성 클로저
    pub async fn find_tree(&self, rows: Vec<Row>, travel_down: bool) -> Result<Closure> {
        let closure = ClosureResolver::new(&self.registry, &self.source)
            .travel_down(travel_down)
            .max_concurrent_lookups(self.max_concurrent_lookups)
            .resolve(rows)
            .await?;
        Ok(closure)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Triggers
    // ─────────────────────────────────────────────────────────────────────────

    /// DB 카탈로그에서 트리거를 읽어 등록
    pub async fn load_triggers(&mut self) -> Result<usize> {
        let triggers = self.source.trigger_definitions().await?;
        self.register_triggers(triggers)
    }

    fn register_triggers(&mut self, triggers: Vec<(String, String)>) -> Result<usize> {
        let count = triggers.len();
        for (name, sql) in triggers {
            self.add_trigger(Trigger::new(name, sql))?;
        }
        info!(triggers = count, "triggers loaded");
        Ok(count)
    }

    /// 트리거 등록 (같은 이름이 있으면 `DuplicateTrigger`)
    pub fn add_trigger(&mut self, trigger: Trigger) -> Result<&Trigger> {
        use std::collections::btree_map::Entry;

        match self.triggers.entry(trigger.name().to_string()) {
            Entry::Occupied(entry) => Err(subset_core::Error::DuplicateTrigger {
                name: entry.key().clone(),
            }
            .into()),
            Entry::Vacant(entry) => Ok(&*entry.insert(trigger)),
        }
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.get(name)
    }

    /// 등록된 트리거 (이름 순)
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Named Locks
    // ─────────────────────────────────────────────────────────────────────────

    /// 이름 잠금 획득 (MySQL 전용)
    pub async fn get_lock(&self, name: &str, timeout: Option<Duration>) -> Result<()> {
        match &self.source {
            SqlSource::MySql(pool) => self.locks.acquire(pool, name, timeout).await,
            SqlSource::Sqlite(_) => Err(self.unsupported("named locks")),
        }
    }

    /// 이름 잠금 해제 (보유 중이 아니면 `false`)
    pub async fn release_lock(&self, name: &str) -> Result<bool> {
        match &self.source {
            SqlSource::MySql(_) => self.locks.release(name).await,
            SqlSource::Sqlite(_) => Err(self.unsupported("named locks")),
        }
    }

    /// 잠금을 잡은 채로 작업 실행
    ///
    /// 작업이 실패해도 잠금은 해제되며, 작업의 에러가 우선합니다.
    pub async fn with_lock<F, Fut, T>(&self, name: &str, timeout: Option<Duration>, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.get_lock(name, timeout).await?;
        let result = work().await;
        let released = self.release_lock(name).await;

        let value = result?;
        released?;
        Ok(value)
    }

    fn unsupported(&self, operation: &'static str) -> SqlError {
        SqlError::Unsupported {
            operation,
            engine: self.engine().name(),
        }
    }

    /// 보유 중인 잠금을 풀고 연결 풀 종료
    pub async fn disconnect(&self) {
        if let Err(e) = self.locks.release_all().await {
            warn!("failed to release named locks: {}", e);
        }
        self.source.close().await;
        info!("disconnected");
    }
}
