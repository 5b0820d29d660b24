//! `tally history` command - Show the migration history table.

use tally_migrate::{HistoryEntry, Migrator};

use crate::cli::{HistoryArgs, OutputFormat};
use crate::config::Config;
use crate::database::Database;
use crate::error::CliResult;
use crate::output;

/// Run the history command
pub async fn run(args: HistoryArgs) -> CliResult<()> {
    let config = Config::load(&args.config.config)?;
    let url = config.database_url(args.database.database_url.as_deref())?;

    let mut db = Database::connect(&url).await?;
    let mut entries = db.history(&Migrator::new()).await?;
    entries.sort_by(|a, b| (&a.group, a.version).cmp(&(&b.group, b.version)));

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => print_table(&entries),
    }
    Ok(())
}

fn print_table(entries: &[HistoryEntry]) {
    output::header("History");

    if entries.is_empty() {
        output::info("No migrations have been applied");
        return;
    }

    for entry in entries {
        output::list_item(&format!(
            "{}.{}  {}  {}  {}  {}ms  {}",
            entry.group,
            entry.version,
            entry.script,
            output::style_status(entry.status),
            entry.applied_at.format("%Y-%m-%d %H:%M:%S"),
            entry.execution_duration.as_millis(),
            output::short_checksum(&entry.checksum)
        ));
        if !entry.log.is_empty() {
            output::dim(&format!("      {}", entry.log));
        }
    }
}
