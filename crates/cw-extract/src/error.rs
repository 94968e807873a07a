//! Error types for cw-extract

use cw_db::DbError;
use thiserror::Error;

/// Extraction and archive errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// X001: A configured source cannot be read at all
    #[error("[X001] Source '{source_name}' unreachable: {reason}")]
    SourceUnreachable { source_name: String, reason: String },

    /// X002: Snapshot file already exists; the archive never overwrites
    #[error("[X002] Archive file already exists: {path}")]
    AlreadyExists { path: String },

    /// X003: Archive write failed
    #[error("[X003] Failed to archive '{path}': {message}")]
    ArchiveWrite { path: String, message: String },

    /// X004: No snapshot with the requested stamp
    #[error("[X004] No archived snapshot with stamp '{stamp}' in {dir}")]
    SnapshotNotFound { stamp: String, dir: String },

    /// X005: Database error while reading or writing
    #[error("[X005] Database error: {0}")]
    Db(#[from] DbError),

    /// X006: IO error
    #[error("[X006] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ExtractError
pub type ExtractResult<T> = Result<T, ExtractError>;
