//! Migration history tracking.
//!
//! One row per applied-or-attempted migration in `migration_schema_history`,
//! keyed by `(group, version)`. Rows are inserted as `executing` right before
//! a migration runs and updated in place afterwards; they are never deleted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::{Connection, SqlRow, SqlValue};
use crate::dialect::Dialect;
use crate::error::{MigrateResult, MigrationError};

/// Name of the history table.
pub const HISTORY_TABLE: &str = "migration_schema_history";

/// DDL for the history table, shared by all dialects.
pub const CREATE_TABLE_SQL: &str = r#"CREATE TABLE IF NOT EXISTS "migration_schema_history"
(
    "group"              VARCHAR(255) NOT NULL,
    "version"            BIGINT       NOT NULL,
    "script"             VARCHAR(255) NOT NULL,
    "type"               VARCHAR(12)  NOT NULL,
    "checksum"           CHAR(64)     NOT NULL,
    "applied_at"         TIMESTAMP    NOT NULL,
    "execution_duration" BIGINT       NOT NULL,
    "status"             VARCHAR(12)  NOT NULL,
    "log"                TEXT         NOT NULL,
    PRIMARY KEY ("group", "version")
)"#;

/// Full scan of the history table, in column order of [`HistoryEntry`].
pub const SELECT_HISTORY_SQL: &str = r#"SELECT "group", "version", "script", "type", "checksum", "applied_at", "execution_duration", "status", "log" FROM "migration_schema_history""#;

/// Outcome of a migration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Recorded but not started.
    Pending,
    /// Statements are running, or the process died while they were.
    Executing,
    /// All statements succeeded.
    Success,
    /// A statement failed; `log` holds the error.
    Failed,
}

impl MigrationStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "executing" => Ok(Self::Executing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(MigrationError::database(format!(
                "unknown migration status '{}'",
                other
            ))),
        }
    }
}

/// Kind of script recorded in the `type` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationType {
    /// Plain SQL statements.
    #[default]
    Sql,
}

impl MigrationType {
    /// Value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
        }
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationType {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sql" => Ok(Self::Sql),
            other => Err(MigrationError::database(format!(
                "unknown migration type '{}'",
                other
            ))),
        }
    }
}

/// A row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Migration group.
    pub group: String,
    /// Migration version.
    pub version: i64,
    /// Script name.
    pub script: String,
    /// Script kind.
    #[serde(rename = "type")]
    pub kind: MigrationType,
    /// Hex SHA-256 of the statements.
    pub checksum: String,
    /// When the attempt started.
    pub applied_at: DateTime<Utc>,
    /// Time spent executing the statements.
    pub execution_duration: Duration,
    /// Outcome of the attempt.
    pub status: MigrationStatus,
    /// Error text for failed attempts.
    pub log: String,
}

impl HistoryEntry {
    /// Check if this entry has the given identity.
    pub fn is(&self, group: &str, version: i64) -> bool {
        self.group == group && self.version == version
    }

    /// Decode a row selected with [`SELECT_HISTORY_SQL`].
    pub fn from_row(row: &SqlRow) -> MigrateResult<Self> {
        let nanos = row.get_i64(6)?;
        let nanos = u64::try_from(nanos).map_err(|_| {
            MigrationError::database(format!("negative execution duration {}", nanos))
        })?;

        Ok(Self {
            group: row.get_str(0)?.to_string(),
            version: row.get_i64(1)?,
            script: row.get_str(2)?.to_string(),
            kind: row.get_str(3)?.parse()?,
            checksum: row.get_str(4)?.trim_end().to_string(),
            applied_at: row.get_timestamp(5)?.and_utc(),
            execution_duration: Duration::from_nanos(nanos),
            status: row.get_str(7)?.parse()?,
            log: row.get_str(8)?.to_string(),
        })
    }

    fn duration_nanos(&self) -> i64 {
        i64::try_from(self.execution_duration.as_nanos()).unwrap_or(i64::MAX)
    }

    /// Parameters for [`Dialect::insert_sql`].
    pub fn insert_params(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.group.as_str()),
            SqlValue::from(self.version),
            SqlValue::from(self.script.as_str()),
            SqlValue::from(self.kind.as_str()),
            SqlValue::from(self.checksum.as_str()),
            SqlValue::from(self.applied_at.naive_utc()),
            SqlValue::from(self.duration_nanos()),
            SqlValue::from(self.status.as_str()),
            SqlValue::from(self.log.as_str()),
        ]
    }

    /// Parameters for [`Dialect::update_sql`].
    pub fn update_params(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.script.as_str()),
            SqlValue::from(self.kind.as_str()),
            SqlValue::from(self.checksum.as_str()),
            SqlValue::from(self.applied_at.naive_utc()),
            SqlValue::from(self.duration_nanos()),
            SqlValue::from(self.status.as_str()),
            SqlValue::from(self.log.as_str()),
            SqlValue::from(self.group.as_str()),
            SqlValue::from(self.version),
        ]
    }
}

/// Create the history table if it does not exist.
pub async fn create_table<C>(conn: &mut C) -> MigrateResult<()>
where
    C: Connection + ?Sized,
{
    conn.execute(CREATE_TABLE_SQL, &[]).await?;
    Ok(())
}

/// Load every history row, in no particular order.
pub async fn load_history<C>(conn: &mut C) -> MigrateResult<Vec<HistoryEntry>>
where
    C: Connection + ?Sized,
{
    let rows = conn
        .query(SELECT_HISTORY_SQL, &[])
        .await
        .map_err(|e| e.context("cannot select history"))?;

    let entries = rows
        .iter()
        .map(HistoryEntry::from_row)
        .collect::<MigrateResult<Vec<_>>>()
        .map_err(|e| e.context("cannot scan entry"))?;

    debug!(count = entries.len(), "Loaded migration history");
    Ok(entries)
}

/// Insert a new history row.
pub async fn insert<C>(dialect: Dialect, conn: &mut C, entry: &HistoryEntry) -> MigrateResult<()>
where
    C: Connection + ?Sized,
{
    conn.execute(dialect.insert_sql(), &entry.insert_params()).await?;
    Ok(())
}

/// Update the non-key columns of the row identified by `(group, version)`.
pub async fn update<C>(dialect: Dialect, conn: &mut C, entry: &HistoryEntry) -> MigrateResult<()>
where
    C: Connection + ?Sized,
{
    conn.execute(dialect.update_sql(), &entry.update_params()).await?;
    Ok(())
}
