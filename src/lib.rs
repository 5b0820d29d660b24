//! # Tally
//!
//! Forward-only SQL migrations for PostgreSQL and MySQL.
//!
//! Tally provides:
//! - Versioned `.sql` scripts organized in independent groups
//! - A history table recording every attempt, with checksums for drift detection
//! - Fail-closed behavior: a failed or interrupted migration blocks further runs
//! - Adapters for `tokio-postgres` and `mysql_async`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tally::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let migrations = load_groups(&[GroupSource::new("core", "migrations/core")], ".").await?;
//!
//!     let mut conn = tally::postgres::PgConnection::connect_url("postgresql://localhost/mydb").await?;
//!     let report = tally::postgres::migrate(&mut conn, &Migrator::new(), &migrations).await?;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration engine: splitting, discovery, history and apply.
pub mod migrate {
    pub use tally_migrate::*;
}

/// PostgreSQL adapter.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use tally_postgres::*;
}

/// MySQL and MariaDB adapter.
#[cfg(feature = "mysql")]
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
pub mod mysql {
    pub use tally_mysql::*;
}

pub use tally_migrate::{
    ApplyReport, Connection, GroupSource, HistoryEntry, MigrateResult, Migration, MigrationError,
    MigrationStatus, Migrator, load_groups,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tally_migrate::{
        ApplyReport, Connection, GroupSource, Migration, MigrationError, Migrator, load_group,
        load_groups,
    };
}
