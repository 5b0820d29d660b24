//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

/// Tally CLI - Forward-only SQL migrations
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version)]
#[command(about = "Tally CLI - Forward-only SQL migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log every statement sent to the database
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Show the migration history table
    History(HistoryArgs),

    /// Validate migration files without touching the database
    Check(CheckArgs),

    /// Display version information
    Version,
}

/// Location of the configuration file
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,
}

/// Database connection override
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL (overrides `database.url` from the config file)
    #[arg(long, env = "TALLY_DATABASE_URL")]
    pub database_url: Option<String>,
}

// =============================================================================
// Migrate Command
// =============================================================================

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

// =============================================================================
// History Command
// =============================================================================

/// Arguments for the `history` command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for listings
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable table
    #[default]
    Table,
    /// One JSON array
    Json,
}

// =============================================================================
// Check Command
// =============================================================================

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}
