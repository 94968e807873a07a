//! Source readers
//!
//! Every configured source is read in full into a [`RawTable`] with its
//! native column names. DuckDB sources are attached read-only into a scratch
//! session; CSV feeds are read with every column as text.

use crate::error::{ExtractError, ExtractResult};
use crate::table::RawTable;
use cw_core::sql_utils::{quote_ident, quote_literal};
use cw_core::{SourceConfig, SourceType};
use cw_db::{Database, DuckDbBackend};
use log::{debug, info, warn};
use std::path::Path;

/// Everything extracted in one run
#[derive(Debug, Clone, Default)]
pub struct ExtractOutput {
    /// Sorted by `(source, table)`
    pub tables: Vec<RawTable>,
    pub warnings: Vec<String>,
}

impl ExtractOutput {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(RawTable::len).sum()
    }
}

/// Reads source systems through a scratch DuckDB session
pub struct SourceReader {
    db: Box<dyn Database>,
}

impl SourceReader {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            db: Box::new(DuckDbBackend::in_memory()?),
        })
    }

    /// Read every source in order and merge the results.
    ///
    /// An unreachable source aborts the whole extraction.
    pub async fn read_all(&self, sources: &[SourceConfig]) -> ExtractResult<ExtractOutput> {
        let mut out = ExtractOutput::default();
        for source in sources {
            let tables = self.read_source(source, &mut out.warnings).await?;
            out.tables.extend(tables);
        }
        out.tables
            .sort_by(|a, b| (&a.source, &a.table).cmp(&(&b.source, &b.table)));
        info!(
            "Extracted {} tables ({} rows) from {} sources",
            out.tables.len(),
            out.total_rows(),
            sources.len()
        );
        Ok(out)
    }

    /// Read all tables of one source
    pub async fn read_source(
        &self,
        source: &SourceConfig,
        warnings: &mut Vec<String>,
    ) -> ExtractResult<Vec<RawTable>> {
        let tables = match source.source_type {
            SourceType::DuckDb => self.read_duckdb(source).await?,
            SourceType::Csv => vec![self.read_csv(source, warnings).await?],
        };
        for t in &tables {
            if t.is_empty() {
                info!("{}: empty table", t.key());
            } else {
                debug!("{}: {} rows, {} columns", t.key(), t.len(), t.columns.len());
            }
        }
        Ok(tables)
    }

    async fn read_duckdb(&self, source: &SourceConfig) -> ExtractResult<Vec<RawTable>> {
        let path = Path::new(&source.path);
        let alias = format!("src_{}", source.name);

        self.db
            .attach(path, &alias, true)
            .await
            .map_err(|e| unreachable(source, e.to_string()))?;

        let result = self.read_attached(source, &alias).await;

        if let Err(e) = self.db.detach(&alias).await {
            warn!("Failed to detach source '{}': {}", source.name, e);
        }
        result
    }

    async fn read_attached(
        &self,
        source: &SourceConfig,
        alias: &str,
    ) -> ExtractResult<Vec<RawTable>> {
        let mut tables = Vec::with_capacity(source.tables.len());
        for table in &source.tables {
            let qualified = format!("{}.{}", alias, table);
            if !self.db.relation_exists(&qualified).await? {
                return Err(unreachable(
                    source,
                    format!("table '{}' not found in {}", table, source.path),
                ));
            }
            let sql = format!("SELECT * FROM {}.{}", quote_ident(alias), quote_ident(table));
            let result = self.db.query_text(&sql).await?;
            tables.push(RawTable::new(&source.name, table, result));
        }
        Ok(tables)
    }

    async fn read_csv(
        &self,
        source: &SourceConfig,
        warnings: &mut Vec<String>,
    ) -> ExtractResult<RawTable> {
        let table = source
            .table_names()
            .pop()
            .unwrap_or_else(|| source.name.clone());
        let path = Path::new(&source.path);

        if !path.exists() {
            if source.optional {
                let msg = format!(
                    "optional source '{}' not found at {}; using an empty table",
                    source.name, source.path
                );
                warn!("{}", msg);
                warnings.push(msg);
                return Ok(RawTable::empty(&source.name, &table));
            }
            return Err(unreachable(
                source,
                format!("file not found: {}", source.path),
            ));
        }

        if std::fs::metadata(path)?.len() == 0 {
            return Ok(RawTable::empty(&source.name, &table));
        }

        let sql = format!(
            "SELECT * FROM read_csv_auto({}, all_varchar = true)",
            quote_literal(&source.path)
        );
        let result = self
            .db
            .query_text(&sql)
            .await
            .map_err(|e| unreachable(source, e.to_string()))?;
        Ok(RawTable::new(&source.name, &table, result))
    }
}

fn unreachable(source: &SourceConfig, reason: String) -> ExtractError {
    ExtractError::SourceUnreachable {
        source_name: source.name.clone(),
        reason,
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;
