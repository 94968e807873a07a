//! Error types for cw-core

use thiserror::Error;

/// Core error type for the campus warehouse
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Unparseable date supplied by the caller
    #[error("[E003] Invalid date '{value}': expected YYYY-MM-DD or DD-MM-YYYY")]
    InvalidDate { value: String },

    /// E004: IO error
    #[error("[E004] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E005: IO error with file path context
    #[error("[E005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E006: YAML parse error
    #[error("[E006] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
