//! `tally migrate` command - Apply pending migrations.

use tally_migrate::{Migrator, load_groups};

use crate::cli::MigrateArgs;
use crate::config::{Config, base_dir};
use crate::database::Database;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the migrate command
pub async fn run(args: MigrateArgs) -> CliResult<()> {
    output::header("Migrate");

    let config_path = &args.config.config;
    let config = Config::load(config_path)?;
    let url = config.database_url(args.database.database_url.as_deref())?;

    output::step(1, 3, "Loading migrations...");
    let migrations = load_groups(&config.groups, base_dir(config_path)).await?;
    output::kv("Groups", &config.groups.len().to_string());
    output::kv("Scripts", &migrations.len().to_string());

    output::step(2, 3, "Connecting to database...");
    let mut db = Database::connect(&url).await?;

    output::step(3, 3, "Applying migrations...");
    let report = db.migrate(&Migrator::new(), &migrations).await?;

    for applied in &report.applied {
        output::list_item(&format!(
            "{}.{} {} ({}ms)",
            applied.group,
            applied.version,
            applied.script,
            applied.duration.as_millis()
        ));
    }

    output::newline();
    success(&report.summary());
    Ok(())
}
