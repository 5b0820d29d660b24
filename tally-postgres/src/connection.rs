//! PostgreSQL connection wrapper.

use async_trait::async_trait;
use tally_migrate::{Connection, MigrateResult, SqlRow, SqlValue, Transaction};
use tokio_postgres::{Client, GenericClient, NoTls};
use tokio_postgres::types::ToSql;
use tracing::{debug, error};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};
use crate::types::{decode_row, to_params};

/// A single PostgreSQL connection.
///
/// The driver's connection future runs on a spawned task and ends once the
/// client is dropped.
pub struct PgConnection {
    client: Client,
}

impl PgConnection {
    /// Connect using a parsed configuration.
    pub async fn connect(config: &PgConfig) -> PgResult<Self> {
        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting to PostgreSQL"
        );

        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| PgError::connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client })
    }

    /// Connect using a `postgres://` URL.
    pub async fn connect_url(url: &str) -> PgResult<Self> {
        Self::connect(&PgConfig::from_url(url)?).await
    }

    /// Begin a transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("Beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction { txn })
    }

    /// Check if the connection has been closed by the server.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    /// Get the underlying tokio-postgres client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

/// A PostgreSQL transaction.
///
/// Dropped without [`commit`](Self::commit), the transaction is rolled back.
pub struct PgTransaction<'a> {
    txn: tokio_postgres::Transaction<'a>,
}

impl<'a> PgTransaction<'a> {
    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("Committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("Rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}

async fn execute_on<C>(client: &C, sql: &str, params: &[SqlValue]) -> PgResult<u64>
where
    C: GenericClient + Sync,
{
    debug!(sql = %sql, params = params.len(), "Executing statement");

    // Unparameterized statements go over the simple query protocol.
    if params.is_empty() {
        client.batch_execute(sql).await?;
        return Ok(0);
    }

    let pg_params = to_params(params);
    let param_refs: Vec<&(dyn ToSql + Sync)> = pg_params.iter().map(|p| p.as_ref() as _).collect();
    Ok(client.execute(sql, &param_refs).await?)
}

async fn query_on<C>(client: &C, sql: &str, params: &[SqlValue]) -> PgResult<Vec<SqlRow>>
where
    C: GenericClient + Sync,
{
    debug!(sql = %sql, params = params.len(), "Executing query");

    let pg_params = to_params(params);
    let param_refs: Vec<&(dyn ToSql + Sync)> = pg_params.iter().map(|p| p.as_ref() as _).collect();
    let rows = client.query(sql, &param_refs).await?;
    rows.iter().map(decode_row).collect()
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        Ok(execute_on(&self.client, sql, params).await?)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        Ok(query_on(&self.client, sql, params).await?)
    }
}

#[async_trait]
impl Connection for PgTransaction<'_> {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        Ok(execute_on(&self.txn, sql, params).await?)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        Ok(query_on(&self.txn, sql, params).await?)
    }
}

#[async_trait]
impl Transaction for PgTransaction<'_> {
    async fn commit(self) -> MigrateResult<()> {
        Ok(PgTransaction::commit(self).await?)
    }

    async fn rollback(self) -> MigrateResult<()> {
        Ok(PgTransaction::rollback(self).await?)
    }
}
