//! Database connections selected by URL scheme.

use tally_migrate::{ApplyReport, HistoryEntry, MigrateResult, Migration, Migrator};
use tally_mysql::MysqlConnection;
use tally_postgres::PgConnection;
use tracing::debug;

use crate::config::Provider;
use crate::error::{CliError, CliResult};

/// An open connection to one of the supported servers.
pub enum Database {
    /// PostgreSQL
    Postgres(PgConnection),
    /// MySQL or MariaDB
    Mysql(MysqlConnection),
}

impl Database {
    /// Connect to the server named by `url`.
    pub async fn connect(url: &str) -> CliResult<Self> {
        let provider = Provider::from_url(url)?;
        debug!(?provider, "Opening database connection");

        match provider {
            Provider::Postgres => PgConnection::connect_url(url)
                .await
                .map(Self::Postgres)
                .map_err(|e| CliError::Database(e.to_string())),
            Provider::Mysql => MysqlConnection::connect_url(url)
                .await
                .map(Self::Mysql)
                .map_err(|e| CliError::Database(e.to_string())),
        }
    }

    /// Apply migrations with the provider's transaction policy.
    pub async fn migrate(
        &mut self,
        migrator: &Migrator,
        migrations: &[Migration],
    ) -> MigrateResult<ApplyReport> {
        match self {
            Self::Postgres(conn) => tally_postgres::migrate(conn, migrator, migrations).await,
            Self::Mysql(conn) => tally_mysql::migrate(conn, migrator, migrations).await,
        }
    }

    /// Read the history table.
    pub async fn history(&mut self, migrator: &Migrator) -> MigrateResult<Vec<HistoryEntry>> {
        match self {
            Self::Postgres(conn) => migrator.history(conn).await,
            Self::Mysql(conn) => migrator.history(conn).await,
        }
    }
}
