//! # tally-migrate
//!
//! Forward-only SQL migration engine.
//!
//! This crate provides functionality for:
//! - Splitting SQL scripts into statements
//! - Loading versioned scripts from per-group directories
//! - Detecting the database dialect from its version banner
//! - Tracking every attempt in a `migration_schema_history` table
//! - Applying pending migrations exactly once, with drift detection
//! - Running a whole batch inside one transaction
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ *.sql files  │────▶│ Statement Split│────▶│ Migration   │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                                                    │
//!                                                    ▼
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Dialect      │────▶│ Migrator       │◀────│ History Tbl │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐
//!                      │ Connection     │
//!                      └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_migrate::{GroupSource, Migrator, load_groups};
//!
//! async fn run(conn: &mut impl tally_migrate::Connection) -> tally_migrate::MigrateResult<()> {
//!     let migrations = load_groups(&[GroupSource::new("core", "migrations/core")], ".").await?;
//!
//!     let migrator = Migrator::new();
//!     let report = migrator.apply(conn, &migrations).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - A `(group, version)` is executed at most once; later calls skip it after
//!   verifying its checksum.
//! - Any history row that is not `success` blocks every further call until
//!   it is fixed by hand.
//! - Within a group, pending migrations run in ascending version order and
//!   the first failing statement stops the whole call.

pub mod checksum;
pub mod connection;
pub mod dialect;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod history;
pub mod migration;
pub mod statement;

// Re-exports
pub use checksum::checksum;
pub use connection::{Connection, SqlRow, SqlValue, Transaction};
pub use dialect::Dialect;
pub use discovery::{GroupSource, extract_version, load_group, load_groups};
pub use engine::{AppliedMigration, ApplyReport, MigrationPlan, Migrator};
pub use error::{MigrateResult, MigrationError};
pub use history::{HistoryEntry, MigrationStatus, MigrationType};
pub use migration::Migration;
pub use statement::split_statements;
