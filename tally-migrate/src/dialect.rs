//! SQL dialect detection.
//!
//! Only the placeholder style of the history statements differs between the
//! supported engines, so the set is closed: adding an engine means adding a
//! variant and its two statements.

use std::fmt;

use tracing::debug;

use crate::connection::{Connection, SqlValue};
use crate::error::{MigrateResult, MigrationError};

const POSTGRES_INSERT_SQL: &str = r#"INSERT INTO "migration_schema_history" ("group", "version", "script", "type", "checksum", "applied_at", "execution_duration", "status", "log") VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)"#;

const POSTGRES_UPDATE_SQL: &str = r#"UPDATE "migration_schema_history" SET "script"=$1, "type"=$2, "checksum"=$3, "applied_at"=$4, "execution_duration"=$5, "status"=$6, "log"=$7 WHERE "group"=$8 AND "version"=$9"#;

const MYSQL_INSERT_SQL: &str = r#"INSERT INTO "migration_schema_history" ("group", "version", "script", "type", "checksum", "applied_at", "execution_duration", "status", "log") VALUES (?,?,?,?,?,?,?,?,?)"#;

const MYSQL_UPDATE_SQL: &str = r#"UPDATE "migration_schema_history" SET "script"=?, "type"=?, "checksum"=?, "applied_at"=?, "execution_duration"=?, "status"=?, "log"=? WHERE "group"=? AND "version"=?"#;

/// Query returning the server's version banner.
pub const VERSION_SQL: &str = "SELECT version()";

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL: numbered `$n` placeholders.
    PostgreSql,
    /// MySQL and MariaDB: positional `?` placeholders.
    MySql,
}

impl Dialect {
    /// Select a dialect from a version banner.
    ///
    /// Examples of banners:
    /// - `PostgreSQL 12.2 on x86_64-apple-darwin19.4.0, compiled by Apple clang ..., 64-bit`
    /// - `10.4.11-MariaDB`
    pub fn from_version_banner(banner: &str) -> MigrateResult<Self> {
        let lower = banner.to_lowercase();
        if lower.contains("postgresql") {
            Ok(Self::PostgreSql)
        } else if lower.contains("mariadb") || lower.contains("mysql") {
            Ok(Self::MySql)
        } else {
            Err(MigrationError::UnsupportedDialect(banner.to_string()))
        }
    }

    /// Query the server banner and select the dialect.
    pub async fn detect<C>(conn: &mut C) -> MigrateResult<Self>
    where
        C: Connection + ?Sized,
    {
        let rows = conn.query(VERSION_SQL, &[]).await?;

        let mut banner = String::new();
        for row in &rows {
            banner = match row.get(0)? {
                SqlValue::Text(s) => s.clone(),
                other => other.to_string(),
            };
        }

        let dialect = Self::from_version_banner(&banner)?;
        debug!(banner = %banner, dialect = %dialect, "Detected database dialect");
        Ok(dialect)
    }

    /// Statement inserting a history row.
    pub fn insert_sql(&self) -> &'static str {
        match self {
            Self::PostgreSql => POSTGRES_INSERT_SQL,
            Self::MySql => MYSQL_INSERT_SQL,
        }
    }

    /// Statement updating the non-key columns of a history row.
    pub fn update_sql(&self) -> &'static str {
        match self {
            Self::PostgreSql => POSTGRES_UPDATE_SQL,
            Self::MySql => MYSQL_UPDATE_SQL,
        }
    }

    /// Lowercase name of the dialect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_banner() {
        let banner = "PostgreSQL 12.2 on x86_64-apple-darwin19.4.0, compiled by Apple clang version 11.0.3 (clang-1103.0.32.59), 64-bit";
        assert_eq!(
            Dialect::from_version_banner(banner).unwrap(),
            Dialect::PostgreSql
        );
    }

    #[test]
    fn test_mysql_banners() {
        assert_eq!(
            Dialect::from_version_banner("10.4.11-MariaDB").unwrap(),
            Dialect::MySql
        );
        assert_eq!(
            Dialect::from_version_banner("8.0.36-MySQL Community Server").unwrap(),
            Dialect::MySql
        );
    }

    #[test]
    fn test_unknown_banner() {
        let err = Dialect::from_version_banner("3.45.1").unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedDialect(ref b) if b == "3.45.1"));
        assert!(Dialect::from_version_banner("").is_err());
    }

    #[test]
    fn test_placeholders() {
        assert!(Dialect::PostgreSql.insert_sql().contains("$9"));
        assert!(!Dialect::PostgreSql.insert_sql().contains('?'));
        assert!(Dialect::MySql.update_sql().contains(r#""group"=?"#));
        assert!(!Dialect::MySql.update_sql().contains('$'));
    }

    #[test]
    fn test_statements_share_columns() {
        let pg = Dialect::PostgreSql.insert_sql().split("VALUES").next().unwrap();
        let my = Dialect::MySql.insert_sql().split("VALUES").next().unwrap();
        assert_eq!(pg, my);
    }
}
