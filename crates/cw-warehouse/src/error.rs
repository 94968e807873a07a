//! Error types for cw-warehouse

use cw_db::DbError;
use thiserror::Error;

/// Warehouse load errors
#[derive(Error, Debug)]
pub enum WarehouseError {
    /// Star schema could not be dropped or created (W001)
    #[error("[W001] Failed to create warehouse schema at {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: DbError,
    },

    /// Table load failed (W002)
    #[error("[W002] Failed to load {table}: {source}")]
    Load {
        table: String,
        #[source]
        source: DbError,
    },

    /// Foreign-key keys could not be read back (W003)
    #[error("[W003] Failed to read keys of {table}.{column}: {source}")]
    KeyLookup {
        table: String,
        column: String,
        #[source]
        source: DbError,
    },

    /// Rows built for a table do not match its columns (W004)
    #[error("[W004] {table} row has {actual} values, expected {expected}")]
    RowShape {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for WarehouseError
pub type WarehouseResult<T> = Result<T, WarehouseError>;
