//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_migrate::GroupSource;

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "tally.toml";

/// Tally CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration groups, applied in name order
    pub groups: Vec<GroupSource>,
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.groups.is_empty() {
            return Err(CliError::Config("no migration groups configured".into()));
        }
        for (i, group) in self.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(CliError::Config(format!("group #{} has an empty name", i + 1)));
            }
            if self.groups[..i].iter().any(|g| g.name == group.name) {
                return Err(CliError::Config(format!(
                    "group '{}' is configured twice",
                    group.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve the database URL, preferring an explicit override.
    pub fn database_url(&self, explicit: Option<&str>) -> CliResult<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.database.url.clone())
            .ok_or_else(|| {
                CliError::Config(
                    "no database URL: set database.url, TALLY_DATABASE_URL or --database-url"
                        .into(),
                )
            })
    }
}

/// Directory that relative group directories are resolved against.
pub fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Database server family, chosen from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `postgres://` or `postgresql://`
    Postgres,
    /// `mysql://` or `mariadb://`
    Mysql,
}

impl Provider {
    /// Pick the provider for a database URL.
    pub fn from_url(url: &str) -> CliResult<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| CliError::Config(format!("invalid database URL: {}", e)))?;
        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            other => Err(CliError::Config(format!(
                "unsupported database scheme '{}'",
                other
            ))),
        }
    }
}
