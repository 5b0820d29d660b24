//! `tally check` command - Validate migration files offline.

use tally_migrate::{MigrationPlan, load_groups};

use crate::cli::CheckArgs;
use crate::config::{Config, base_dir};
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the check command
pub async fn run(args: CheckArgs) -> CliResult<()> {
    output::header("Check");

    let config_path = &args.config.config;
    let config = Config::load(config_path)?;
    let migrations = load_groups(&config.groups, base_dir(config_path)).await?;

    // Same version rules as a first apply against an empty database.
    MigrationPlan::build(&[], &migrations)?;

    for group in &config.groups {
        output::section(&group.name);
        for migration in migrations.iter().filter(|m| m.group == group.name) {
            output::list_item(&format!(
                "{:>6}  {}  ({} statements, {})",
                migration.version,
                migration.script_name,
                migration.statements.len(),
                output::short_checksum(&migration.checksum())
            ));
        }
        output::newline();
    }

    success(&format!(
        "{} migrations in {} groups are valid",
        migrations.len(),
        config.groups.len()
    ));
    Ok(())
}
