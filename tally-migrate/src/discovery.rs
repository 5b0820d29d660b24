//! Loading migrations from per-group directories of `*.sql` scripts.
//!
//! ```text
//! migrations/
//! ├── core/
//! │   ├── 001_create_users.sql
//! │   └── 002_add_email_index.sql
//! └── billing/
//!     └── v1_invoices.sql
//! ```
//!
//! The version of a script is made of all digits in its file name, so
//! `v1_2_invoices.sql` has version 12.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};
use crate::migration::Migration;
use crate::statement::split_statements;

/// A group name and the directory its scripts live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSource {
    /// Group the scripts belong to.
    pub name: String,
    /// Directory holding the scripts.
    pub directory: PathBuf,
}

impl GroupSource {
    /// Create a new group source.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}

/// Extract the version from a script file name.
///
/// Returns `None` when the name has no digits or the number does not fit
/// into an `i64`.
pub fn extract_version(file_name: &str) -> Option<i64> {
    let digits: String = file_name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Load all `*.sql` scripts directly inside `dir` as migrations of `group`.
///
/// Scripts are read in file name order. A script without a version, with an
/// unterminated statement, or without any statement is an error.
pub async fn load_group(group: &str, dir: impl AsRef<Path>) -> MigrateResult<Vec<Migration>> {
    let dir = dir.as_ref();
    debug!(group = %group, dir = %dir.display(), "Reading schema directory");

    let mut entries = tokio::fs::read_dir(dir).await.map_err(MigrationError::Io)?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(MigrationError::Io)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sql") && is_file(&entry).await? {
            paths.push(path);
        }
    }
    paths.sort();

    let mut migrations = Vec::with_capacity(paths.len());
    for path in paths {
        migrations.push(read_script(group, &path).await?);
    }

    Ok(migrations)
}

/// Load every group, resolving relative directories against `base`.
pub async fn load_groups(
    sources: &[GroupSource],
    base: impl AsRef<Path>,
) -> MigrateResult<Vec<Migration>> {
    let base = base.as_ref();
    let mut migrations = Vec::new();
    for source in sources {
        let dir = base.join(&source.directory);
        migrations.extend(load_group(&source.name, &dir).await?);
    }
    Ok(migrations)
}

/// Regular files, following symlinks.
async fn is_file(entry: &tokio::fs::DirEntry) -> MigrateResult<bool> {
    let file_type = entry.file_type().await.map_err(MigrationError::Io)?;
    if !file_type.is_symlink() {
        return Ok(file_type.is_file());
    }
    match tokio::fs::metadata(entry.path()).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MigrationError::Io(e)),
    }
}

async fn read_script(group: &str, path: &Path) -> MigrateResult<Migration> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            MigrationError::invalid_migration(format!("invalid path: {}", path.display()))
        })?;

    let version = extract_version(file_name).ok_or_else(|| {
        MigrationError::invalid_migration(format!("invalid migration file name: {}", file_name))
    })?;

    let sql = tokio::fs::read_to_string(path)
        .await
        .map_err(MigrationError::Io)?;

    let statements = split_statements(&sql).map_err(|e| match e {
        MigrationError::Syntax(msg) => {
            MigrationError::syntax(format!("cannot parse {}: {}", path.display(), msg))
        }
        other => other,
    })?;

    if statements.is_empty() {
        return Err(MigrationError::invalid_migration(format!(
            "migration file without statements: {}",
            path.display()
        )));
    }

    debug!(script = %file_name, statements = statements.len(), "Loaded migration");
    Ok(Migration::new(group, version, statements, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("001_create_users.sql"), Some(1));
        assert_eq!(extract_version("v1_2_invoices.sql"), Some(12));
        assert_eq!(extract_version("20240101120000_init.sql"), Some(20240101120000));
    }

    #[test]
    fn test_extract_version_invalid() {
        assert_eq!(extract_version("init.sql"), None);
        assert_eq!(extract_version("99999999999999999999_huge.sql"), None);
    }

    #[test]
    fn test_group_source() {
        let source = GroupSource::new("core", "migrations/core");
        assert_eq!(source.name, "core");
        assert_eq!(source.directory, PathBuf::from("migrations/core"));
    }
}
