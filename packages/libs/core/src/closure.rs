//! 의존성 클로저 탐색
//!
//! 시드 행에서 시작해 외래키 링크를 따라가며 도달 가능한 모든 행을 모읍니다.
//!
//! # 탐색 규칙
//!
//! - 행은 `(테이블, 행 식별자)`로 방문 처리되며, 확장 전에 원자적으로 예약됩니다.
//!   같은 행은 동시에 여러 경로로 도달해도 한 번만 확장됩니다.
//! - 상향 링크는 항상, 하향 링크는 `travel_down`일 때만 따라갑니다.
//! - 값이 null인 링크는 조회하지 않습니다.
//! - 한 행의 링크 조회와 조회된 행들의 확장은 동시에 진행됩니다.
//! - 링크가 레지스트리에 없는 테이블을 가리키면 `UnknownTable`로 전체 탐색이 실패합니다.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::WhereClause;
use crate::link::{compute_links, RowLink};
use crate::row::Row;
use crate::schema::{Table, TableRegistry};
use crate::source::DataSource;

// ─────────────────────────────────────────────────────────────────────────────
// Closure
// ─────────────────────────────────────────────────────────────────────────────

/// 탐색 결과: 테이블 이름 → 방문한 행
///
/// 테이블 안의 행 순서는 보장되지 않습니다. 방문한 행이 없는 테이블은 나타나지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    tables: BTreeMap<String, Vec<Row>>,
}

impl Closure {
    /// 결과에 포함된 테이블 이름 (이름 순)
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    /// 테이블의 행 (없으면 빈 슬라이스)
    pub fn rows(&self, table_name: &str) -> &[Row] {
        self.tables.get(table_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 행 포함 여부
    pub fn contains(&self, table_name: &str, id: &str) -> bool {
        self.rows(table_name).iter().any(|row| row.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables.iter().map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// 전체 행 수
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<Row>> {
        self.tables
    }

    /// 참조 대상이 먼저 오도록 정렬한 결과
    ///
    /// 레지스트리의 `creation_order()`를 따르며, 레지스트리에 없는 테이블은 뒤에 붙습니다.
    pub fn ordered<'a>(&'a self, registry: &TableRegistry) -> Vec<(&'a str, &'a [Row])> {
        let mut ordered = Vec::with_capacity(self.tables.len());

        for name in registry.creation_order() {
            if let Some((name, rows)) = self.tables.get_key_value(name.as_str()) {
                ordered.push((name.as_str(), rows.as_slice()));
            }
        }

        for (name, rows) in &self.tables {
            if !registry.contains(name) {
                ordered.push((name.as_str(), rows.as_slice()));
            }
        }

        ordered
    }

    /// `{ "TABLE": [ {row}, ... ] }` 형식의 JSON
    pub fn to_json(&self) -> Value {
        tables_to_json(self.iter())
    }

    /// `ordered()` 순서의 JSON
    pub fn to_ordered_json(&self, registry: &TableRegistry) -> Value {
        tables_to_json(self.ordered(registry))
    }
}

fn tables_to_json<'a>(tables: impl IntoIterator<Item = (&'a str, &'a [Row])>) -> Value {
    let mut object = Map::new();
    for (name, rows) in tables {
        let rows = rows
            .iter()
            .map(|row| Value::Object(row.data().clone()))
            .collect();
        object.insert(name.to_string(), Value::Array(rows));
    }
    Value::Object(object)
}

// ─────────────────────────────────────────────────────────────────────────────
// Visited State
// ─────────────────────────────────────────────────────────────────────────────

/// 탐색 1회 동안 공유되는 방문 상태
#[derive(Debug, Default)]
struct VisitedState {
    rows: Mutex<HashMap<String, HashMap<String, Row>>>,
}

impl VisitedState {
    /// 처음 보는 행이면 기록하고 `true`
    ///
    /// 확인과 기록이 하나의 잠금 안에서 일어나므로 같은 행은 한 번만 `true`가 됩니다.
    fn reserve(&self, row: &Row) -> bool {
        let mut rows = self.rows.lock();
        let table = rows.entry(row.table_name().to_string()).or_default();

        match table.entry(row.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
                true
            }
        }
    }

    fn into_closure(self) -> Closure {
        let tables = self
            .rows
            .into_inner()
            .into_iter()
            .map(|(name, rows)| (name, rows.into_values().collect()))
            .collect();
        Closure { tables }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// 클로저 탐색기
///
/// ```ignore
/// let closure = ClosureResolver::new(&registry, &source)
///     .travel_down(true)
///     .max_concurrent_lookups(Some(8))
///     .resolve(seeds)
///     .await?;
/// ```
pub struct ClosureResolver<'a> {
    registry: &'a TableRegistry,
    source: &'a dyn DataSource,
    travel_down: bool,
    limiter: Option<Semaphore>,
}

impl<'a> ClosureResolver<'a> {
    pub fn new(registry: &'a TableRegistry, source: &'a dyn DataSource) -> Self {
        Self {
            registry,
            source,
            travel_down: false,
            limiter: None,
        }
    }

    /// 하향 링크도 따라갈지 (기본: false)
    pub fn travel_down(mut self, travel_down: bool) -> Self {
        self.travel_down = travel_down;
        self
    }

    /// 동시에 진행되는 조회 수 제한 (기본: 제한 없음)
    pub fn max_concurrent_lookups(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Semaphore::new(n.max(1)));
        self
    }

    /// 시드 행들의 클로저 계산
    ///
    /// 시드 행 자신도 결과에 포함됩니다. 에러가 나면 부분 결과는 버려집니다.
    pub async fn resolve(&self, seeds: impl IntoIterator<Item = Row>) -> Result<Closure> {
        let walk = Walk {
            resolver: self,
            visited: VisitedState::default(),
        };

        try_join_all(seeds.into_iter().map(|row| walk.expand(row))).await?;

        let closure = walk.visited.into_closure();
        info!(
            tables = closure.tables.len(),
            rows = closure.row_count(),
            travel_down = self.travel_down,
            "dependency closure resolved"
        );
        Ok(closure)
    }

    /// 조회 허가 (제한이 없으면 `None`)
    ///
    /// 세마포어는 탐색기 안에만 있고 닫히지 않으므로 `acquire`는 실패하지 않습니다.
    async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        }
    }
}

struct Walk<'r, 'a> {
    resolver: &'r ClosureResolver<'a>,
    visited: VisitedState,
}

impl Walk<'_, '_> {
    fn expand(&self, row: Row) -> BoxFuture<'_, Result<()>> {
        async move {
            if !self.visited.reserve(&row) {
                return Ok(());
            }

            let known_tables = self.resolver.registry.tables().map(Arc::as_ref);
            let links = compute_links(&row, self.resolver.travel_down, known_tables);
            debug!(
                table = row.table_name(),
                id = row.id(),
                links = links.len(),
                "expanding row"
            );

            let follows = links
                .into_iter()
                .filter(|link| !link.has_null())
                .map(|link| self.follow(link));
            try_join_all(follows).await?;

            Ok(())
        }
        .boxed()
    }

    async fn follow(&self, link: RowLink) -> Result<()> {
        let table = self
            .resolver
            .registry
            .get(&link.table_name)
            .ok_or_else(|| Error::UnknownTable {
                name: link.table_name.clone(),
            })?;

        let rows = {
            let _permit = self.resolver.acquire().await;
            fetch_rows(table, &link.filter, self.resolver.source).await?
        };

        try_join_all(rows.into_iter().map(|row| self.expand(row))).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Points
// ─────────────────────────────────────────────────────────────────────────────

/// 테이블에서 조건에 맞는 행을 읽어 `Row`로 감쌉니다
pub async fn fetch_rows(
    table: &Arc<Table>,
    filter: &WhereClause,
    source: &dyn DataSource,
) -> Result<Vec<Row>> {
    let rows = source.select(table.name(), filter).await?;
    debug!(table = table.name(), matched = rows.len(), "lookup complete");

    Ok(rows
        .into_iter()
        .map(|data| Row::from_data(Arc::clone(table), data))
        .collect())
}

/// 기본 설정(동시 조회 제한 없음)으로 클로저 계산
pub async fn find_dependency_closure(
    registry: &TableRegistry,
    source: &dyn DataSource,
    seeds: impl IntoIterator<Item = Row>,
    travel_down: bool,
) -> Result<Closure> {
    ClosureResolver::new(registry, source)
        .travel_down(travel_down)
        .resolve(seeds)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::row::RowData;
    use crate::schema::{ColumnDescription, ConstraintDescription, TableDescription};
    use crate::source::MemorySource;

    fn fixture_registry() -> TableRegistry {
        let mut registry = TableRegistry::new();
        registry
            .register(Table::new(
                TableDescription::new("USERS")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("xpk"))
                    .column(ColumnDescription::new("firstname"))
                    .column(ColumnDescription::new("lastname"))
                    .constraint(ConstraintDescription::unique(["firstname", "lastname"])),
            ))
            .unwrap();
        registry
            .register(Table::new(
                TableDescription::new("SECOND_TABLE")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("xfirstname"))
                    .column(ColumnDescription::new("xlastname"))
                    .constraint(ConstraintDescription::foreign_key(
                        ["xfirstname", "xlastname"],
                        "USERS",
                        ["firstname", "lastname"],
                    ))
                    .constraint(ConstraintDescription::foreign_key(
                        ["xlastname"],
                        "USERS",
                        ["lastname"],
                    )),
            ))
            .unwrap();
        registry
    }

    fn fixture_source() -> MemorySource {
        MemorySource::new()
            .with_rows(
                "USERS",
                vec![
                    json!({ "id": 1, "xpk": 1337, "firstname": "first", "lastname": "last" }),
                    json!({ "id": 2, "xpk": 1, "firstname": "2-first", "lastname": "2-last" }),
                ],
            )
            .with_rows(
                "SECOND_TABLE",
                vec![
                    json!({ "id": 1, "xfirstname": "2-first", "xlastname": "2-last" }),
                    json!({ "id": 2, "xfirstname": "first", "xlastname": "last" }),
                ],
            )
    }

    async fn seed(
        registry: &TableRegistry,
        source: &dyn DataSource,
        table: &str,
        filter: WhereClause,
    ) -> Vec<Row> {
        fetch_rows(registry.get(table).unwrap(), &filter, source)
            .await
            .unwrap()
    }

    fn ids(closure: &Closure, table: &str) -> Vec<String> {
        let mut ids: Vec<String> = closure
            .rows(table)
            .iter()
            .map(|row| row.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_travel_down() {
        let registry = fixture_registry();
        let source = fixture_source();
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty().eq("id", 1)).await;

        let closure = find_dependency_closure(&registry, &source, seeds, true)
            .await
            .unwrap();

        assert_eq!(ids(&closure, "USERS"), vec!["[1]"]);
        assert_eq!(ids(&closure, "SECOND_TABLE"), vec!["[2]"]);
        assert_eq!(closure.row_count(), 2);
    }

    #[tokio::test]
    async fn test_up_only() {
        let registry = fixture_registry();
        let source = fixture_source();
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty().eq("id", 1)).await;

        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();

        assert_eq!(closure.table_names().collect::<Vec<_>>(), vec!["USERS"]);
        assert!(closure.rows("SECOND_TABLE").is_empty());
    }

    #[tokio::test]
    async fn test_links_up_from_child() {
        let registry = fixture_registry();
        let source = fixture_source();
        let seeds = seed(&registry, &source, "SECOND_TABLE", WhereClause::empty()).await;

        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();

        assert_eq!(ids(&closure, "SECOND_TABLE"), vec!["[1]", "[2]"]);
        assert_eq!(ids(&closure, "USERS"), vec!["[1]", "[2]"]);
    }

    #[tokio::test]
    async fn test_zero_lookup_limit_still_resolves() {
        let registry = fixture_registry();
        let source = fixture_source();
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty().eq("id", 1)).await;

        let closure = ClosureResolver::new(&registry, &source)
            .travel_down(true)
            .max_concurrent_lookups(Some(0))
            .resolve(seeds)
            .await
            .unwrap();

        assert_eq!(ids(&closure, "SECOND_TABLE"), vec!["[2]"]);
    }

    #[tokio::test]
    async fn test_empty_seeds() {
        let registry = fixture_registry();
        let source = fixture_source();

        let closure = find_dependency_closure(&registry, &source, Vec::new(), true)
            .await
            .unwrap();

        assert!(closure.is_empty());
        assert_eq!(source.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_seeds_collapse() {
        let registry = fixture_registry();
        let source = fixture_source();
        let mut seeds = seed(&registry, &source, "USERS", WhereClause::empty().eq("id", 1)).await;
        seeds.extend(seed(&registry, &source, "USERS", WhereClause::empty().eq("id", 1)).await);

        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();

        assert_eq!(closure.rows("USERS").len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table_fails() {
        let mut registry = TableRegistry::new();
        registry
            .register(Table::new(
                TableDescription::new("USERS")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("xpk"))
                    .constraint(ConstraintDescription::foreign_key(
                        ["xpk"],
                        "FAKE_TABLE",
                        ["userID"],
                    )),
            ))
            .unwrap();
        let source = MemorySource::new().with_rows("USERS", vec![json!({ "id": 1, "xpk": 7 })]);
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty()).await;

        let err = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTable { ref name } if name == "FAKE_TABLE"));
    }

    #[tokio::test]
    async fn test_null_links_are_not_followed() {
        let mut registry = TableRegistry::new();
        registry
            .register(Table::new(
                TableDescription::new("USERS")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("xpk"))
                    .constraint(ConstraintDescription::foreign_key(
                        ["xpk"],
                        "FAKE_TABLE",
                        ["userID"],
                    )),
            ))
            .unwrap();
        let source = MemorySource::new().with_rows("USERS", vec![json!({ "id": 1, "xpk": null })]);
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty()).await;

        // FAKE_TABLE은 레지스트리에 없지만 null 링크라 조회되지 않음
        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();
        assert_eq!(closure.row_count(), 1);
        assert_eq!(source.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let mut registry = TableRegistry::new();
        registry
            .register(Table::new(
                TableDescription::new("A")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("b_id"))
                    .constraint(ConstraintDescription::foreign_key(["b_id"], "B", ["id"])),
            ))
            .unwrap();
        registry
            .register(Table::new(
                TableDescription::new("B")
                    .column(ColumnDescription::new("id").primary())
                    .column(ColumnDescription::new("a_id"))
                    .constraint(ConstraintDescription::foreign_key(["a_id"], "A", ["id"])),
            ))
            .unwrap();
        let source = MemorySource::new()
            .with_rows("A", vec![json!({ "id": 1, "b_id": 10 })])
            .with_rows("B", vec![json!({ "id": 10, "a_id": 1 })]);
        let seeds = seed(&registry, &source, "A", WhereClause::empty()).await;

        let closure = find_dependency_closure(&registry, &source, seeds, true)
            .await
            .unwrap();

        assert_eq!(ids(&closure, "A"), vec!["[1]"]);
        assert_eq!(ids(&closure, "B"), vec!["[10]"]);
    }

    fn diamond_registry() -> TableRegistry {
        let mut registry = TableRegistry::new();
        let tables = [
            ("ROOT", vec![("left_id", "LEFT"), ("right_id", "RIGHT")]),
            ("LEFT", vec![("shared_id", "SHARED")]),
            ("RIGHT", vec![("shared_id", "SHARED")]),
            ("SHARED", vec![("leaf_id", "LEAF")]),
            ("LEAF", vec![]),
        ];
        for (name, refs) in tables {
            let mut desc = TableDescription::new(name).column(ColumnDescription::new("id").primary());
            for (column, target) in refs {
                desc = desc
                    .column(ColumnDescription::new(column))
                    .constraint(ConstraintDescription::foreign_key([column], target, ["id"]));
            }
            registry.register(Table::new(desc)).unwrap();
        }
        registry
    }

    /// 테이블별 조회 수를 세는 소스
    struct CountingSource {
        inner: MemorySource,
        counts: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingSource {
        fn new(inner: MemorySource) -> Self {
            Self {
                inner,
                counts: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn count(&self, table: &str) -> usize {
            self.counts.lock().get(table).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn select(&self, table_name: &str, filter: &WhereClause) -> Result<Vec<RowData>> {
            *self.counts.lock().entry(table_name.to_string()).or_default() += 1;

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.inner.select(table_name, filter).await
        }
    }

    fn diamond_source() -> CountingSource {
        CountingSource::new(
            MemorySource::new()
                .with_rows("ROOT", vec![json!({ "id": 1, "left_id": 1, "right_id": 1 })])
                .with_rows("LEFT", vec![json!({ "id": 1, "shared_id": 1 })])
                .with_rows("RIGHT", vec![json!({ "id": 1, "shared_id": 1 })])
                .with_rows("SHARED", vec![json!({ "id": 1, "leaf_id": 1 })])
                .with_rows("LEAF", vec![json!({ "id": 1 })]),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_row_expanded_once() {
        let registry = diamond_registry();
        let source = diamond_source();
        let seeds = seed(&registry, &source, "ROOT", WhereClause::empty()).await;

        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();

        assert_eq!(closure.row_count(), 5);
        // SHARED는 LEFT와 RIGHT 양쪽에서 조회되지만, 확장은 한 번이므로 LEAF 조회도 한 번
        assert_eq!(source.count("SHARED"), 2);
        assert_eq!(source.count("LEAF"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_max_concurrent_lookups() {
        let registry = diamond_registry();
        let source = diamond_source();
        let seeds = seed(&registry, &source, "ROOT", WhereClause::empty()).await;

        let closure = ClosureResolver::new(&registry, &source)
            .max_concurrent_lookups(Some(1))
            .resolve(seeds)
            .await
            .unwrap();

        assert_eq!(closure.row_count(), 5);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_data_source_error_aborts() {
        let registry = fixture_registry();
        // SECOND_TABLE이 없는 소스
        let source = MemorySource::new().with_rows(
            "USERS",
            vec![json!({ "id": 1, "xpk": 1337, "firstname": "first", "lastname": "last" })],
        );
        let seeds = seed(&registry, &source, "USERS", WhereClause::empty()).await;

        let err = find_dependency_closure(&registry, &source, seeds, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DataSource { ref table, .. } if table == "SECOND_TABLE"));
    }

    #[tokio::test]
    async fn test_ordered_output() {
        let registry = fixture_registry();
        let source = fixture_source();
        let seeds = seed(&registry, &source, "SECOND_TABLE", WhereClause::empty().eq("id", 2)).await;

        let closure = find_dependency_closure(&registry, &source, seeds, false)
            .await
            .unwrap();

        let names: Vec<&str> = closure.ordered(&registry).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["USERS", "SECOND_TABLE"]);

        let json = closure.to_ordered_json(&registry);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["USERS", "SECOND_TABLE"]);
        assert_eq!(json["SECOND_TABLE"][0]["id"], json!(2));
    }
}
