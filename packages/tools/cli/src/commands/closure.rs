//! Closure 명령어

use subset_sql::Database;
use tracing::info;

use super::{parse_conditions, validate_conditions};
use crate::OutputFormat;

pub async fn extract(
    db: &Database,
    table: &str,
    conditions: &[String],
    down: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let filter = parse_conditions(conditions)?;
    validate_conditions(db, table, &filter)?;

    let seeds = db.select(table, &filter).await?;
    info!(table, seeds = seeds.len(), travel_down = down, "resolving dependency closure");
    let seed_count = seeds.len();

    let closure = db.find_tree(seeds, down).await?;

    match format {
        OutputFormat::Json => {
            let output = closure.to_ordered_json(db.registry());
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "Closure of {} ({} seed rows, travel down: {}):",
                table,
                seed_count,
                if down { "yes" } else { "no" }
            );
            for (name, rows) in closure.ordered(db.registry()) {
                println!("  {}: {} rows", name, rows.len());
            }
            println!("Total: {} rows", closure.row_count());
        }
    }
    Ok(())
}
