//! CLI 명령어 구현

pub mod closure;
pub mod config;
pub mod links;
pub mod tables;
pub mod triggers;

use subset_core::WhereClause;
use subset_sql::Database;

use crate::context::EffectiveContext;

/// 연결 후 테이블/트리거 로드
pub async fn open_database(ctx: &EffectiveContext) -> anyhow::Result<Database> {
    let url = ctx.require_database_url()?;
    let mut db = Database::connect(url, &ctx.connect_options()).await?;
    db.load_all().await?;
    Ok(db)
}

/// `--where COLUMN=VALUE` 목록 → 조건
pub fn parse_conditions(conditions: &[String]) -> anyhow::Result<WhereClause> {
    conditions
        .iter()
        .map(|pair| WhereClause::parse_pair(pair).map_err(anyhow::Error::from))
        .collect()
}

/// 시드 조건이 테이블 컬럼만 쓰는지 확인
pub fn validate_conditions(
    db: &Database,
    table: &str,
    filter: &WhereClause,
) -> anyhow::Result<()> {
    let schema = db
        .table(table)
        .ok_or_else(|| anyhow::anyhow!("Unknown table '{}'. Run 'subset tables' to list tables.", table))?;
    let columns: Vec<&str> = schema.column_names().collect();
    filter.validate(&columns)?;
    Ok(())
}
