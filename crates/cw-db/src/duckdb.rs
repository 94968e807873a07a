//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, TextResult};
use crate::value::SqlValue;
use async_trait::async_trait;
use cw_core::sql_utils::{quote_ident, quote_literal, quote_qualified};
use duckdb::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::ConnectionError(format!("{}: {}", parent.display(), e))
                })?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    fn with_transaction<F, T>(conn: &Connection, body: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(DbError::from)?;
        Ok(count as usize)
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;

        let (catalog, table) = match name.rfind('.') {
            Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
            None => (None, name),
        };

        let mut sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = {}",
            quote_literal(table)
        );
        match catalog {
            Some(c) => sql.push_str(&format!(" AND table_catalog = {}", quote_literal(c))),
            None => sql.push_str(" AND table_schema = 'main' AND table_catalog = current_database()"),
        }

        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(DbError::from)?;

        Ok(count > 0)
    }

    /// Column names of a query, in order
    fn describe_columns(conn: &Connection, sql: &str) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(&format!("DESCRIBE {}", sql))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get::<_, String>(0)?);
        }
        Ok(columns)
    }

    fn query_text_sync(&self, sql: &str) -> DbResult<TextResult> {
        let conn = self.lock()?;
        let columns = Self::describe_columns(&conn, sql)?;
        if columns.is_empty() {
            return Ok(TextResult::default());
        }

        let projection = columns
            .iter()
            .map(|c| format!("CAST({0} AS VARCHAR) AS {0}", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let text_sql = format!("SELECT {} FROM ({}) AS src", projection, sql);

        let mut stmt = conn.prepare(&text_sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(row.get::<_, Option<String>>(i)?);
            }
            out.push(values);
        }

        Ok(TextResult { columns, rows: out })
    }

    fn query_keys_sync(&self, sql: &str) -> DbResult<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT CAST(k AS VARCHAR) FROM ({}) AS src(k) WHERE k IS NOT NULL",
            sql
        ))?;
        let mut rows = stmt.query([])?;
        let mut keys = HashSet::new();
        while let Some(row) = rows.next()? {
            keys.insert(row.get::<_, String>(0)?);
        }
        Ok(keys)
    }

    fn query_sample_rows_sync(&self, sql: &str, limit: usize) -> DbResult<Vec<String>> {
        let limited = format!("SELECT * FROM ({}) AS sample LIMIT {}", sql, limit);
        let result = self.query_text_sync(&limited)?;
        Ok(result
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| v.unwrap_or_else(|| "NULL".to_string()))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect())
    }

    fn insert_rows_sync(
        &self,
        table: &str,
        columns: &[(&str, &str)],
        rows: &[Vec<SqlValue>],
    ) -> DbResult<usize> {
        if rows.is_empty() || columns.is_empty() {
            return Ok(0);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DbError::RowShape {
                    row: i,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }

        let column_list = columns
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = format!(
            "({})",
            columns
                .iter()
                .map(|(_, ty)| format!("CAST(? AS {})", ty))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_qualified(table),
            column_list,
            vec![placeholders; rows.len()].join(", ")
        );

        let conn = self.lock()?;
        Self::with_transaction(&conn, |conn| {
            conn.execute(&sql, params_from_iter(rows.iter().flatten()))
                .map_err(|e| DbError::ExecutionError(format!("insert into {}: {}", table, e)))
        })
    }

    fn attach_sync(&self, path: &Path, alias: &str, read_only: bool) -> DbResult<()> {
        if !path.exists() {
            return Err(DbError::AttachError {
                path: path.display().to_string(),
                message: "file does not exist".to_string(),
            });
        }
        let mode = if read_only { " (READ_ONLY)" } else { "" };
        let sql = format!(
            "ATTACH {} AS {}{}",
            quote_literal(&path.display().to_string()),
            quote_ident(alias),
            mode
        );
        let conn = self.lock()?;
        conn.execute_batch(&sql).map_err(|e| DbError::AttachError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_text(&self, sql: &str) -> DbResult<TextResult> {
        self.query_text_sync(sql)
    }

    async fn query_keys(&self, sql: &str) -> DbResult<HashSet<String>> {
        self.query_keys_sync(sql)
    }

    async fn query_sample_rows(&self, sql: &str, limit: usize) -> DbResult<Vec<String>> {
        self.query_sample_rows_sync(sql, limit)
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[(&str, &str)],
        rows: &[Vec<SqlValue>],
    ) -> DbResult<usize> {
        self.insert_rows_sync(table, columns, rows)
    }

    async fn attach(&self, path: &Path, alias: &str, read_only: bool) -> DbResult<()> {
        self.attach_sync(path, alias, read_only)
    }

    async fn detach(&self, alias: &str) -> DbResult<()> {
        self.execute_batch_sync(&format!("DETACH {}", quote_ident(alias)))
    }

    async fn copy_to_parquet(&self, select: &str, path: &Path) -> DbResult<()> {
        let sql = format!(
            "COPY ({}) TO {} (FORMAT PARQUET)",
            select,
            quote_literal(&path.display().to_string())
        );
        self.execute_batch_sync(&sql)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
