//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while loading or applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error while reading migration scripts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// A script ends in the middle of a statement.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Invalid migration script (no version, no statements, bad name).
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// Duplicate, regressing or negative version among the pending migrations of a group.
    #[error("the version must be >=0 and unique: {group}.{version} ({script})")]
    InvalidVersion {
        /// Migration group.
        group: String,
        /// Offending version.
        version: i64,
        /// Script that carries the version.
        script: String,
    },

    /// An already applied migration has been modified.
    #[error(
        "an already applied migration has been modified. Needs manual fix: \
         {group}.{version} expected checksum {expected}, got {actual}"
    )]
    ChecksumMismatch {
        /// Migration group.
        group: String,
        /// Migration version.
        version: i64,
        /// Checksum stored in the history table.
        expected: String,
        /// Checksum of the supplied statements.
        actual: String,
    },

    /// The history table contains a row that is not `success`.
    #[error("migrations are dirty. Needs manual fix: {group}.{version} is {status}")]
    Dirty {
        /// Migration group.
        group: String,
        /// Migration version.
        version: i64,
        /// Status found in the history table.
        status: String,
    },

    /// A statement of a migration failed.
    #[error("failed to execute migration {group}.{version}: {message}")]
    Execution {
        /// Migration group.
        group: String,
        /// Migration version.
        version: i64,
        /// Error reported by the database.
        message: String,
    },

    /// The database banner matches none of the supported dialects.
    #[error("unknown database type: {0}")]
    UnsupportedDialect(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a syntax error.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create an invalid migration error.
    pub fn invalid_migration(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Prefix a database error with the phase it happened in.
    ///
    /// Other variants are returned unchanged.
    pub fn context(self, phase: &str) -> Self {
        match self {
            Self::Database(msg) => Self::Database(format!("{}: {}", phase, msg)),
            other => other,
        }
    }

    /// Check if this error was raised before touching the database.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax(_) | Self::InvalidMigration(_) | Self::InvalidVersion { .. }
        )
    }

    /// Check if the database needs a human before migrations can continue.
    pub fn needs_manual_fix(&self) -> bool {
        matches!(
            self,
            Self::Dirty { .. } | Self::ChecksumMismatch { .. } | Self::Execution { .. }
        )
    }
}
