//! Error types for cw-pipeline

use cw_audit::AuditError;
use cw_core::CoreError;
use cw_db::DbError;
use cw_extract::ExtractError;
use cw_warehouse::WarehouseError;
use thiserror::Error;

/// Fatal pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: Configuration or run report error
    #[error("[P001] {0}")]
    Core(#[from] CoreError),

    /// P002: Extraction or replay failed
    #[error("[P002] {0}")]
    Extract(#[from] ExtractError),

    /// P003: The warehouse cannot be opened
    #[error("[P003] Cannot open warehouse '{path}': {source}")]
    Connect { path: String, source: DbError },

    /// P004: Schema creation or load failed
    #[error("[P004] {0}")]
    Warehouse(#[from] WarehouseError),

    /// P005: Audit could not run
    #[error("[P005] {0}")]
    Audit(#[from] AuditError),
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
