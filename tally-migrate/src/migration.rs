//! The migration value type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::checksum;
use crate::error::MigrateResult;
use crate::statement::split_statements;

/// One versioned unit of change inside a group.
///
/// Identity is `(group, version)`. The value is immutable once built; the
/// engine never rewrites statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Namespace the version is unique in.
    pub group: String,
    /// Ordering key within the group.
    pub version: i64,
    /// Statements, executed in order.
    pub statements: Vec<String>,
    /// Name of the script the statements came from.
    pub script_name: String,
}

impl Migration {
    /// Create a migration from already split statements.
    pub fn new<I, S>(
        group: impl Into<String>,
        version: i64,
        statements: I,
        script_name: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: group.into(),
            version,
            statements: statements.into_iter().map(Into::into).collect(),
            script_name: script_name.into(),
        }
    }

    /// Create a migration by splitting a raw SQL script.
    pub fn from_sql(
        group: impl Into<String>,
        version: i64,
        sql: &str,
        script_name: impl Into<String>,
    ) -> MigrateResult<Self> {
        let statements = split_statements(sql)?;
        Ok(Self::new(group, version, statements, script_name))
    }

    /// Checksum of the statements, as stored in the history table.
    pub fn checksum(&self) -> String {
        checksum(&self.statements)
    }

    /// Check if this migration has the given identity.
    pub fn is(&self, group: &str, version: i64) -> bool {
        self.group == group && self.version == version
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.group, self.version, self.script_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new("core", 1, ["CREATE TABLE users (id INT)"], "001_users.sql");

        assert_eq!(migration.group, "core");
        assert_eq!(migration.version, 1);
        assert_eq!(migration.statements.len(), 1);
        assert!(migration.is("core", 1));
        assert!(!migration.is("core", 2));
        assert_eq!(migration.to_string(), "core.1 (001_users.sql)");
    }

    #[test]
    fn test_from_sql() {
        let migration =
            Migration::from_sql("core", 2, "SELECT 1; -- note\nSELECT 2;", "002.sql").unwrap();
        assert_eq!(migration.statements, vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(migration.checksum(), checksum(&["SELECT 1", "SELECT 2"]));

        assert!(Migration::from_sql("core", 3, "SELECT 1", "003.sql").is_err());
    }
}
