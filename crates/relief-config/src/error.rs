//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Configuration result type
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Config has no file path; load or save_as first")]
    NoPath,

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
