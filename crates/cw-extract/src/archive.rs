//! Bronze raw archive
//!
//! Each extracted table is written verbatim to
//! `<archive>/<source>_<table>_<stamp>.parquet`, next to a
//! `manifest_<stamp>.json` listing the snapshot. Files are never overwritten,
//! and a failed write for one table does not stop the others.

use crate::error::{ExtractError, ExtractResult};
use crate::table::RawTable;
use chrono::{DateTime, Utc};
use cw_core::sql_utils::{quote_ident, quote_literal};
use cw_db::{Database, DuckDbBackend, SqlValue, TextResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STAGE_TABLE: &str = "bronze_stage";
const STAGE_CHUNK: usize = 1000;

/// Run timestamp used to key every snapshot file of one run
pub fn new_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%3f").to_string()
}

/// One archived dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: String,
    pub table: String,
    /// File name relative to the archive directory
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Index of one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub stamp: String,
    pub created_at: DateTime<Utc>,
    pub datasets: Vec<ManifestEntry>,
}

/// A dataset that could not be archived
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveFailure {
    pub source: String,
    pub table: String,
    pub error: String,
}

/// Outcome of archiving one run
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub stamp: String,
    pub written: Vec<ManifestEntry>,
    pub failed: Vec<ArchiveFailure>,
    /// Tables with no columns (absent optional feeds), not archived
    pub skipped: Vec<String>,
    pub manifest: Option<PathBuf>,
}

fn snapshot_file_name(source: &str, table: &str, stamp: &str) -> String {
    format!("{}_{}_{}.parquet", source, table, stamp)
}

fn manifest_file_name(stamp: &str) -> String {
    format!("manifest_{}.json", stamp)
}

/// Writes snapshots through a scratch DuckDB session
pub struct ArchiveWriter {
    dir: PathBuf,
    db: DuckDbBackend,
}

impl ArchiveWriter {
    pub fn new(dir: impl Into<PathBuf>) -> ExtractResult<Self> {
        Ok(Self {
            dir: dir.into(),
            db: DuckDbBackend::in_memory()?,
        })
    }

    /// Archive every table under `stamp`.
    ///
    /// Only an unusable archive directory is an error; per-table failures
    /// are logged and reported in the summary.
    pub async fn write(&self, tables: &[RawTable], stamp: &str) -> ExtractResult<ArchiveSummary> {
        fs::create_dir_all(&self.dir)?;

        let mut summary = ArchiveSummary {
            stamp: stamp.to_string(),
            written: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            manifest: None,
        };

        for table in tables {
            if table.columns.is_empty() {
                debug!("{}: no columns, not archived", table.key());
                summary.skipped.push(table.key());
                continue;
            }
            match self.write_table(table, stamp).await {
                Ok(entry) => {
                    debug!("Archived {} -> {}", table.key(), entry.file);
                    summary.written.push(entry);
                }
                Err(e) => {
                    warn!("Failed to archive {}: {}", table.key(), e);
                    summary.failed.push(ArchiveFailure {
                        source: table.source.clone(),
                        table: table.table.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let manifest = ArchiveManifest {
            stamp: stamp.to_string(),
            created_at: Utc::now(),
            datasets: summary.written.clone(),
        };
        let manifest_path = self.dir.join(manifest_file_name(stamp));
        match write_new_json(&manifest_path, &manifest) {
            Ok(()) => summary.manifest = Some(manifest_path),
            Err(e) => {
                warn!("Failed to write archive manifest: {}", e);
            }
        }

        info!(
            "Archived {} datasets under stamp {} ({} failed)",
            summary.written.len(),
            stamp,
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn write_table(&self, table: &RawTable, stamp: &str) -> ExtractResult<ManifestEntry> {
        let file = snapshot_file_name(&table.source, &table.table, stamp);
        let path = self.dir.join(&file);
        if path.exists() {
            return Err(ExtractError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        let tmp_path = self.dir.join(format!("{}.tmp", file));

        let result = self.stage_and_copy(table, &tmp_path).await;
        let _ = self
            .db
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", STAGE_TABLE))
            .await;
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).map_err(|e| ExtractError::ArchiveWrite {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(ManifestEntry {
            source: table.source.clone(),
            table: table.table.clone(),
            file,
            rows: table.len(),
            columns: table.columns.clone(),
        })
    }

    async fn stage_and_copy(&self, table: &RawTable, path: &Path) -> ExtractResult<()> {
        let column_defs = table
            .columns
            .iter()
            .map(|c| format!("{} VARCHAR", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        self.db
            .execute_batch(&format!(
                "CREATE OR REPLACE TABLE {} ({})",
                STAGE_TABLE, column_defs
            ))
            .await?;

        let columns: Vec<(&str, &str)> = table
            .columns
            .iter()
            .map(|c| (c.as_str(), "VARCHAR"))
            .collect();
        for chunk in table.rows.chunks(STAGE_CHUNK) {
            let rows: Vec<Vec<SqlValue>> = chunk
                .iter()
                .map(|row| row.iter().map(|v| SqlValue::from(v.clone())).collect())
                .collect();
            self.db.insert_rows(STAGE_TABLE, &columns, &rows).await?;
        }

        self.db
            .copy_to_parquet(&format!("SELECT * FROM {}", STAGE_TABLE), path)
            .await
            .map_err(|e| ExtractError::ArchiveWrite {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}

/// Reads archived snapshots back
pub struct ArchiveReader {
    dir: PathBuf,
    db: DuckDbBackend,
}

impl ArchiveReader {
    pub fn new(dir: impl Into<PathBuf>) -> ExtractResult<Self> {
        Ok(Self {
            dir: dir.into(),
            db: DuckDbBackend::in_memory()?,
        })
    }

    /// Stamps of every archived run, oldest first
    pub fn list_runs(&self) -> ExtractResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut stamps = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(stamp) = name
                .strip_prefix("manifest_")
                .and_then(|s| s.strip_suffix(".json"))
            {
                stamps.push(stamp.to_string());
            }
        }
        stamps.sort();
        Ok(stamps)
    }

    pub fn manifest(&self, stamp: &str) -> ExtractResult<ArchiveManifest> {
        let path = self.dir.join(manifest_file_name(stamp));
        if !path.exists() {
            return Err(ExtractError::SnapshotNotFound {
                stamp: stamp.to_string(),
                dir: self.dir.display().to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read every dataset of a snapshot back into memory, sorted by
    /// `(source, table)`
    pub async fn replay(&self, stamp: &str) -> ExtractResult<Vec<RawTable>> {
        let manifest = self.manifest(stamp)?;
        let mut tables = Vec::with_capacity(manifest.datasets.len());
        for entry in &manifest.datasets {
            let path = self.dir.join(&entry.file);
            let result = self
                .db
                .query_text(&format!(
                    "SELECT * FROM read_parquet({})",
                    quote_literal(&path.display().to_string())
                ))
                .await?;
            tables.push(RawTable::new(
                &entry.source,
                &entry.table,
                TextResult {
                    columns: entry.columns.clone(),
                    rows: result.rows,
                },
            ));
        }
        tables.sort_by(|a, b| (&a.source, &a.table).cmp(&(&b.source, &b.table)));
        info!("Replayed {} datasets from snapshot {}", tables.len(), stamp);
        Ok(tables)
    }
}

/// Write JSON to a path that must not exist yet
fn write_new_json<T: Serialize>(path: &Path, value: &T) -> ExtractResult<()> {
    if path.exists() {
        return Err(ExtractError::AlreadyExists {
            path: path.display().to_string(),
        });
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "archive_test.rs"]
mod tests;
