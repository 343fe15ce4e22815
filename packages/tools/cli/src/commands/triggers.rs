//! Triggers 명령어

use subset_sql::Database;

use crate::OutputFormat;

pub fn dump(db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let triggers: Vec<_> = db.triggers().collect();
            println!("{}", serde_json::to_string_pretty(&triggers)?);
        }
        OutputFormat::Text => {
            for trigger in db.triggers() {
                println!("-- trigger: {}", trigger.name());
                println!("{}", trigger.to_sql());
                println!();
            }
        }
    }
    Ok(())
}
