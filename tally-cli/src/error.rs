//! CLI error types and result alias.

use miette::Diagnostic;
use tally_migrate::MigrationError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(tally::config),
        help("tally.toml needs a [database] url and one [[groups]] entry per directory")
    )]
    Config(String),

    /// Invalid migration files
    #[error("Invalid migrations: {0}")]
    #[diagnostic(code(tally::check))]
    Check(String),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(tally::migration))]
    Migration(String),

    /// The history table needs a human before migrations can continue
    #[error("Migration error: {0}")]
    #[diagnostic(
        code(tally::manual_fix),
        help("fix the schema by hand, then update or delete the offending row in migration_schema_history")
    )]
    ManualFix(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(tally::database))]
    Database(String),

    /// JSON output error
    #[error("Output error: {0}")]
    #[diagnostic(code(tally::output))]
    Output(String),
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        if err.needs_manual_fix() {
            CliError::ManualFix(err.to_string())
        } else if err.is_configuration_error() {
            CliError::Check(err.to_string())
        } else {
            CliError::Migration(err.to_string())
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}
