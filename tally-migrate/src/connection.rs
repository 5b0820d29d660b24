//! The narrow database capability the engine runs against.
//!
//! Anything that can execute a parameterized statement and return rows can
//! drive a [`Migrator`](crate::Migrator): a plain connection, a transaction,
//! or an in-memory fake in tests.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{MigrateResult, MigrationError};

/// A parameter or column value exchanged with the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    BigInt(i64),
    /// Text of any character type.
    Text(String),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Name of the variant, used in decoding errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::BigInt(_) => "bigint",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::BigInt(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

/// One row returned by [`Connection::query`], columns in select order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlRow {
    values: Vec<SqlValue>,
}

impl SqlRow {
    /// Create a row from its column values.
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `idx`.
    pub fn get(&self, idx: usize) -> MigrateResult<&SqlValue> {
        self.values.get(idx).ok_or_else(|| {
            MigrationError::database(format!(
                "column {} out of range ({} columns)",
                idx,
                self.values.len()
            ))
        })
    }

    /// Text value at `idx`.
    pub fn get_str(&self, idx: usize) -> MigrateResult<&str> {
        match self.get(idx)? {
            SqlValue::Text(s) => Ok(s),
            other => Err(unexpected(idx, "text", other)),
        }
    }

    /// Integer value at `idx`.
    pub fn get_i64(&self, idx: usize) -> MigrateResult<i64> {
        match self.get(idx)? {
            SqlValue::BigInt(v) => Ok(*v),
            other => Err(unexpected(idx, "bigint", other)),
        }
    }

    /// Timestamp value at `idx`.
    pub fn get_timestamp(&self, idx: usize) -> MigrateResult<NaiveDateTime> {
        match self.get(idx)? {
            SqlValue::Timestamp(v) => Ok(*v),
            other => Err(unexpected(idx, "timestamp", other)),
        }
    }

    /// Consume the row into its values.
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

fn unexpected(idx: usize, wanted: &str, got: &SqlValue) -> MigrationError {
    MigrationError::database(format!(
        "column {}: expected {}, got {}",
        idx,
        wanted,
        got.kind()
    ))
}

/// Database capability required by the migration engine.
///
/// Implementations surface every driver error as
/// [`MigrationError::Database`]; nothing is retried.
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Execute a statement and return the number of affected rows.
    ///
    /// An empty `params` slice means the statement is sent as-is, which lets
    /// drivers use their simple/text protocol for arbitrary DDL.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64>;

    /// Execute a query and return all rows.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>>;
}

#[async_trait::async_trait]
impl<C: Connection + ?Sized> Connection for &mut C {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<u64> {
        (**self).execute(sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<SqlRow>> {
        (**self).query(sql, params).await
    }
}

/// A [`Connection`] scoped to an open database transaction.
///
/// Used by [`Migrator::apply_in_transaction`](crate::Migrator::apply_in_transaction)
/// to make a batch atomic.
#[async_trait::async_trait]
pub trait Transaction: Connection + Sized {
    /// Make everything executed through the transaction permanent.
    async fn commit(self) -> MigrateResult<()>;

    /// Discard everything executed through the transaction.
    async fn rollback(self) -> MigrateResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let ts = chrono::DateTime::from_timestamp(1_600_000_000, 0)
            .unwrap()
            .naive_utc();
        let row = SqlRow::new(vec![
            SqlValue::from("core"),
            SqlValue::from(7_i64),
            SqlValue::from(ts),
        ]);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get_str(0).unwrap(), "core");
        assert_eq!(row.get_i64(1).unwrap(), 7);
        assert_eq!(row.get_timestamp(2).unwrap(), ts);
    }

    #[test]
    fn test_row_type_mismatch() {
        let row = SqlRow::new(vec![SqlValue::Null]);
        let err = row.get_str(0).unwrap_err();
        assert!(err.to_string().contains("expected text, got null"));
        assert!(row.get_i64(3).is_err());
    }
}
