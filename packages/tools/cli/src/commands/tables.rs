//! Tables 명령어

use serde_json::json;
use subset_core::schema::{IdentityKey, Table};
use subset_sql::Database;

use crate::OutputFormat;

pub fn list(db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    let registry = db.registry();
    let unresolved = registry.validate_references();

    if format == OutputFormat::Json {
        let tables: Vec<_> = registry
            .tables()
            .map(|table| {
                json!({
                    "name": table.name(),
                    "columns": table.column_names().collect::<Vec<_>>(),
                    "identity": table.identity_key(),
                    "foreign_keys": table.foreign_key_refs(),
                    "warning": table.warning().map(|w| w.to_string()),
                })
            })
            .collect();
        let output = json!({
            "engine": db.engine(),
            "tables": tables,
            "creation_order": registry.creation_order(),
            "unresolved_references": unresolved.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Tables ({}, {}):", registry.len(), db.engine());
    for table in registry.tables() {
        println!("  {}  key: {}", table.name(), describe_key(table));
        for reference in table.foreign_key_refs() {
            println!(
                "    -> {} ({} -> {})",
                reference.referenced_table,
                reference.internal_columns.join(", "),
                reference.referenced_columns.join(", ")
            );
        }
    }

    if !registry.is_empty() {
        println!();
        println!("Creation order: {}", registry.creation_order().join(", "));
    }

    let warnings: Vec<String> = registry
        .tables()
        .filter_map(|table| table.warning().map(|w| w.to_string()))
        .chain(unresolved.iter().map(|e| e.to_string()))
        .collect();
    if !warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}

fn describe_key(table: &Table) -> String {
    match table.identity_key() {
        IdentityKey::Missing => "(none)".to_string(),
        key => format!("{}({})", key.kind(), key.columns().join(", ")),
    }
}
