//! MySQL connection wrapper.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row, TxOpts};
use tally_migrate::{Connection, MigrateResult, SqlRow, SqlValue, Transaction};
use tracing::debug;

use crate::config::MysqlConfig;
use crate::error::MysqlResult;
use crate::types::{decode_row, to_params};

/// A wrapper around a MySQL connection.
///
/// Connections opened with [`connect`](Self::connect) have `ANSI_QUOTES`
/// enabled for their session.
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    /// Wrap an existing driver connection.
    ///
    /// The session must already accept double-quoted identifiers.
    pub fn new(conn: Conn) -> Self {
        Self { conn }
    }

    /// Open a connection.
    pub async fn connect(config: &MysqlConfig) -> MysqlResult<Self> {
        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting to MySQL"
        );
        let conn = Conn::new(config.to_opts_builder()).await?;
        Ok(Self { conn })
    }

    /// Open a connection from a `mysql://` or `mariadb://` URL.
    pub async fn connect_url(url: &str) -> MysqlResult<Self> {
        Self::connect(&MysqlConfig::from_url(url)?).await
    }

    /// Begin a transaction.
    ///
    /// DDL statements commit implicitly on MySQL, so a transaction only
    /// makes data changes and history writes atomic.
    pub async fn transaction(&mut self) -> MysqlResult<MysqlTransaction<'_>> {
        debug!("Beginning transaction");
        let txn = self.conn.start_transaction(TxOpts::default()).await?;
        Ok(MysqlTransaction { txn })
    }

    /// Close the connection gracefully.
    pub async fn disconnect(self) -> MysqlResult<()> {
        self.conn.disconnect().await?;
        Ok(())
    }

    /// Get the inner connection.
    pub fn inner(&self) -> &Conn {
        &self.conn
    }
}

/// A MySQL transaction.
pub struct MysqlTransaction<'a> {
    txn: mysql_async::Transaction<'a>,
}

impl MysqlTransaction<'_> {
    /// Commit the transaction.
    pub async fn commit(self) -> MysqlResult<()> {
        debug!("Committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> MysqlResult<()> {
        debug!("Rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Anything statements can be sent over.
trait Session: Queryable + Send {
    fn affected_rows(&self) -> u64;
}

impl Session for Conn {
    fn affected_rows(&self) -> u64 {
        Conn::affected_rows(self)
    }
}

impl Session for mysql_async::Transaction<'_> {
    fn affected_rows(&self) -> u64 {
        mysql_async::Transaction::affected_rows(self)
    }
}

async fn execute_on<S: Session>(
    session: &mut S,
    sql: &str,
    params: &[SqlValue],
) -> MysqlResult<u64> {
    debug!(sql = %sql, params = params.len(), "Executing statement");

    // Text protocol for plain statements; some DDL cannot be prepared.
    if params.is_empty() {
        session.query_drop(sql).await?;
    } else {
        session.exec_drop(sql, to_params(params)).await?;
    }
    Ok(session.affected_rows())
}

async fn query_on<S: Session>(
    session: &mut S,
    sql: &str,
    params: &[SqlValue],
) -> MysqlResult<Vec<SqlRow>> {
    debug!(sql = %sql, params = params.len(), "Executing query");

    // Binary protocol so columns come back typed.
    let rows: Vec<Row> = session.exec(sql, to_params(params)).await?;
    rows.iter().map(decode_row).collect()
}

#[async_trait]
impl Connection for MysqlConnection {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        Ok(execute_on(&mut self.conn, sql, params).await?)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        Ok(query_on(&mut self.conn, sql, params).await?)
    }
}

#[async_trait]
impl Connection for MysqlTransaction<'_> {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        Ok(execute_on(&mut self.txn, sql, params).await?)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        Ok(query_on(&mut self.txn, sql, params).await?)
    }
}

#[async_trait]
impl Transaction for MysqlTransaction<'_> {
    async fn commit(self) -> MigrateResult<()> {
        Ok(MysqlTransaction::commit(self).await?)
    }

    async fn rollback(self) -> MigrateResult<()> {
        Ok(MysqlTransaction::rollback(self).await?)
    }
}
