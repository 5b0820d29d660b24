//! In-memory stand-in for a database connection.
//!
//! Understands the history table statements issued by the engine and records
//! every other statement as executed. Statements containing `INVALID` fail.
//! [`FakeDb::begin`] opens a transaction whose rollback restores the state
//! seen at begin.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tally_migrate::{
    Connection, HistoryEntry, MigrateResult, MigrationError, MigrationStatus, SqlRow, SqlValue,
    Transaction,
};

pub const POSTGRES_BANNER: &str = "PostgreSQL 12.2 on x86_64-apple-darwin19.4.0, compiled by Apple clang version 11.0.3 (clang-1103.0.32.59), 64-bit";
pub const MARIADB_BANNER: &str = "10.4.11-MariaDB";

/// Tracks how many calls are inside the fake at the same time.
#[derive(Debug, Default)]
pub struct Probe {
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[derive(Debug)]
pub struct FakeDb {
    pub banner: String,
    pub table_created: bool,
    pub history: Vec<Vec<SqlValue>>,
    pub executed: Vec<String>,
    pub calls: Vec<(String, Vec<SqlValue>)>,
    pub probe: Option<Arc<Probe>>,
    pub commits: usize,
    pub rollbacks: usize,
    pub fail_commit: bool,
}

/// State restored by a rollback.
#[derive(Debug, Clone)]
struct Snapshot {
    table_created: bool,
    history: Vec<Vec<SqlValue>>,
    executed: Vec<String>,
}

impl FakeDb {
    pub fn new(banner: &str) -> Self {
        Self {
            banner: banner.to_string(),
            table_created: false,
            history: Vec::new(),
            executed: Vec::new(),
            calls: Vec::new(),
            probe: None,
            commits: 0,
            rollbacks: 0,
            fail_commit: false,
        }
    }

    pub fn postgres() -> Self {
        Self::new(POSTGRES_BANNER)
    }

    pub fn mariadb() -> Self {
        Self::new(MARIADB_BANNER)
    }

    pub fn with_probe(mut self, probe: Arc<Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Seed a history row as if a previous run had written it.
    pub fn seed(&mut self, group: &str, version: i64, checksum: &str, status: MigrationStatus) {
        self.table_created = true;
        self.history.push(vec![
            SqlValue::from(group),
            SqlValue::from(version),
            SqlValue::from(format!("{:03}.sql", version)),
            SqlValue::from("sql"),
            SqlValue::from(checksum),
            SqlValue::from(Utc::now().naive_utc()),
            SqlValue::from(0_i64),
            SqlValue::from(status.as_str()),
            SqlValue::from(""),
        ]);
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.history
            .iter()
            .map(|row| HistoryEntry::from_row(&SqlRow::new(row.clone())).unwrap())
            .collect()
    }

    pub fn entry(&self, group: &str, version: i64) -> Option<HistoryEntry> {
        self.entries().into_iter().find(|e| e.is(group, version))
    }

    /// Open a transaction on this database.
    pub fn begin(&mut self) -> FakeTxn<'_> {
        FakeTxn {
            saved: self.snapshot(),
            db: self,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            table_created: self.table_created,
            history: self.history.clone(),
            executed: self.executed.clone(),
        }
    }

    fn restore(&mut self, saved: Snapshot) {
        self.table_created = saved.table_created;
        self.history = saved.history;
        self.executed = saved.executed;
    }

    async fn enter(&self) {
        if let Some(probe) = &self.probe {
            let now = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn key_of(row: &[SqlValue]) -> (SqlValue, SqlValue) {
        (row[0].clone(), row[1].clone())
    }
}

#[async_trait::async_trait]
impl Connection for FakeDb {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        self.enter().await;
        self.calls.push((sql.to_string(), params.to_vec()));

        if sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "migration_schema_history""#) {
            self.table_created = true;
            return Ok(0);
        }

        if sql.starts_with(r#"INSERT INTO "migration_schema_history""#) {
            assert_eq!(params.len(), 9, "insert takes 9 parameters");
            let key = Self::key_of(params);
            if self.history.iter().any(|row| Self::key_of(row) == key) {
                return Err(MigrationError::database(
                    "duplicate key value violates unique constraint",
                ));
            }
            self.history.push(params.to_vec());
            return Ok(1);
        }

        if sql.starts_with(r#"UPDATE "migration_schema_history""#) {
            assert_eq!(params.len(), 9, "update takes 9 parameters");
            let key = (params[7].clone(), params[8].clone());
            let Some(row) = self.history.iter_mut().find(|row| Self::key_of(row) == key) else {
                return Ok(0);
            };
            row[2..9].clone_from_slice(&params[0..7]);
            return Ok(1);
        }

        if sql.contains("INVALID") {
            return Err(MigrationError::database(format!(
                "syntax error at or near \"INVALID\" in {}",
                sql
            )));
        }

        self.executed.push(sql.to_string());
        Ok(0)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        self.enter().await;
        self.calls.push((sql.to_string(), params.to_vec()));

        if sql == "SELECT version()" {
            return Ok(vec![SqlRow::new(vec![SqlValue::from(self.banner.as_str())])]);
        }

        if sql.contains(r#"FROM "migration_schema_history""#) {
            if !self.table_created {
                return Err(MigrationError::database(
                    "relation \"migration_schema_history\" does not exist",
                ));
            }
            return Ok(self.history.iter().cloned().map(SqlRow::new).collect());
        }

        Err(MigrationError::database(format!("unexpected query: {}", sql)))
    }
}

/// Transaction over a [`FakeDb`].
#[derive(Debug)]
pub struct FakeTxn<'a> {
    db: &'a mut FakeDb,
    saved: Snapshot,
}

#[async_trait::async_trait]
impl Connection for FakeTxn<'_> {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        self.db.execute(sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        self.db.query(sql, params).await
    }
}

#[async_trait::async_trait]
impl Transaction for FakeTxn<'_> {
    async fn commit(self) -> MigrateResult<()> {
        if self.db.fail_commit {
            self.db.restore(self.saved);
            return Err(MigrationError::database("connection reset by peer"));
        }
        self.db.commits += 1;
        Ok(())
    }

    async fn rollback(self) -> MigrateResult<()> {
        self.db.restore(self.saved);
        self.db.rollbacks += 1;
        Ok(())
    }
}
