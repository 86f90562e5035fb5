//! Configuration types and parsing for liftlog.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Special database path selecting a throwaway in-memory store.
pub const MEMORY_DATABASE: &str = ":memory:";

const CONFIG_FILE_NAMES: &[&str] = &["liftlog.yml", "liftlog.yaml"];

/// Main project configuration from liftlog.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration definition discovery
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file, or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Migration directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Directory containing `NNNN_description.sql` files
    #[serde(default = "default_migrations_dir")]
    pub dir: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
        }
    }
}

/// Where the store lives once relative paths are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// In-memory store, discarded when the handle is dropped
    Memory,
    /// File-backed store
    File(PathBuf),
}

fn default_db_path() -> String {
    "liftlog.duckdb".to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for liftlog.yml or liftlog.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Like [`load_from_dir`](Self::load_from_dir), but falls back to the
    /// defaults when the directory has no config file at all.
    pub fn load_from_dir_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!(
                    "No liftlog.yml in {}, using default configuration",
                    dir.display()
                );
                Ok(Self::default())
            }
        }
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        if self.migrations.dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.dir cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the store location relative to the project root
    pub fn database_location(&self, root: &Path) -> DatabaseLocation {
        if self.database.path == MEMORY_DATABASE {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(root.join(&self.database.path))
        }
    }

    /// Get absolute path to the migrations directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations.dir)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
