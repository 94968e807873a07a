//! cw-warehouse - Gold star schema and loader for the campus warehouse
//!
//! Table definitions are declarative; DDL, dedup keys and foreign-key
//! filters are all derived from them.

pub mod error;
pub mod loader;
pub mod rows;
pub mod schema;
pub mod tables;

pub use error::{WarehouseError, WarehouseResult};
pub use loader::{create_schema, LoadReport, LoadStats, Loader};
pub use rows::{build_star, TableRows};
pub use schema::{Column, ForeignKey, TableDef};
pub use tables::LOAD_ORDER;
