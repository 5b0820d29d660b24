//! Error types for MySQL operations.

use std::fmt;

use tally_migrate::MigrationError;

/// Result type for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Error type for MySQL operations.
#[derive(Debug)]
pub enum MysqlError {
    /// MySQL driver error.
    Mysql(mysql_async::Error),
    /// Configuration error.
    Config(String),
    /// Type conversion error.
    TypeConversion(String),
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }
}

impl fmt::Display for MysqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mysql(e) => write!(f, "MySQL error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::TypeConversion(msg) => write!(f, "Type conversion error: {}", msg),
        }
    }
}

impl std::error::Error for MysqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mysql(e) => Some(e),
            _ => None,
        }
    }
}

impl From<mysql_async::Error> for MysqlError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Mysql(err)
    }
}

impl From<MysqlError> for MigrationError {
    fn from(err: MysqlError) -> Self {
        match err {
            MysqlError::Mysql(mysql_async::Error::Server(e)) => {
                MigrationError::database(format!("{} ({})", e.message, e.code))
            }
            other => MigrationError::database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MysqlError::config("invalid url");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("invalid url"));
    }

    #[test]
    fn test_into_migration_error() {
        let err: MigrationError = MysqlError::type_conversion("TIME column").into();
        assert!(matches!(err, MigrationError::Database(ref msg) if msg.contains("TIME column")));
    }
}
