//! cw-db - Database access layer for the campus warehouse
//!
//! This crate provides the `Database` trait and its DuckDB implementation,
//! used for reading source systems, writing Bronze snapshots and loading the
//! Gold warehouse.

pub mod duckdb;
pub mod error;
pub mod traits;
pub mod value;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, TextResult};
pub use value::SqlValue;
