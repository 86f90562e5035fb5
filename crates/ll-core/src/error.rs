//! Error types for ll-core

use thiserror::Error;

/// Core error type for Liftlog
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Config YAML parse error
    #[error("[C003] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C004: IO error with file path context
    #[error("[C004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C005: Migration identifier does not follow the naming convention
    #[error("[C005] Invalid migration id '{id}': {reason}")]
    InvalidMigrationId { id: String, reason: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
