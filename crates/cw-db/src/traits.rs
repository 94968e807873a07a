//! Database trait definition

use crate::error::DbResult;
use crate::value::SqlValue;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Result set with every value rendered as text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Database abstraction used by every pipeline stage
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Check if a table or view exists (optionally `catalog.table`)
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Row count of a query
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Run a query and render every value as text, keeping column names
    /// verbatim. NULL stays `None`.
    async fn query_text(&self, sql: &str) -> DbResult<TextResult>;

    /// Distinct non-null values of the first column of a query, as text
    async fn query_keys(&self, sql: &str) -> DbResult<HashSet<String>>;

    /// Up to `limit` rows of a query, each as a comma-separated string
    async fn query_sample_rows(&self, sql: &str, limit: usize) -> DbResult<Vec<String>>;

    /// Insert rows in a single transaction
    ///
    /// `columns` pairs each column name with the SQL type its parameter is
    /// cast to. Returns the number of rows inserted.
    async fn insert_rows(
        &self,
        table: &str,
        columns: &[(&str, &str)],
        rows: &[Vec<SqlValue>],
    ) -> DbResult<usize>;

    /// Attach another database file under `alias`
    async fn attach(&self, path: &Path, alias: &str, read_only: bool) -> DbResult<()>;

    /// Detach a previously attached database
    async fn detach(&self, alias: &str) -> DbResult<()>;

    /// Write the result of a SELECT to a parquet file
    async fn copy_to_parquet(&self, select: &str, path: &Path) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
