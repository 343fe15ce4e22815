//! Links 명령어
//!
//! 시드 행의 링크를 따라가지 않고 보여줍니다. null 링크는 탐색에서 제외되는 것으로 표시됩니다.

use serde_json::json;
use subset_core::link::compute_links;
use subset_sql::Database;

use super::{parse_conditions, validate_conditions};
use crate::OutputFormat;

pub async fn show(
    db: &Database,
    table: &str,
    conditions: &[String],
    down: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let filter = parse_conditions(conditions)?;
    validate_conditions(db, table, &filter)?;

    let rows = db.select(table, &filter).await?;

    let mut output = Vec::with_capacity(rows.len());
    for row in &rows {
        let links = compute_links(row, down, db.registry().tables().map(|t| &**t));

        match format {
            OutputFormat::Json => output.push(json!({
                "table": row.table_name(),
                "id": row.id(),
                "links": links.iter().map(|link| json!({
                    "table": link.table_name,
                    "where": link.filter,
                    "followed": !link.has_null(),
                })).collect::<Vec<_>>(),
            })),
            OutputFormat::Text => {
                println!("{} {}", row.table_name(), row.id());
                if links.is_empty() {
                    println!("  (no links)");
                }
                for link in &links {
                    let skipped = if link.has_null() { "  [null, skipped]" } else { "" };
                    println!(
                        "  -> {} {}{}",
                        link.table_name,
                        serde_json::to_string(&link.filter)?,
                        skipped
                    );
                }
            }
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if rows.is_empty() {
        println!("No rows in {} match the seed condition.", table);
    }
    Ok(())
}
