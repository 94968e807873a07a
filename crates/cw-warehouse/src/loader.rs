//! Star-schema loader
//!
//! The schema is rebuilt on every load. Each table is then deduplicated,
//! filtered against the keys already loaded into the tables it references,
//! and inserted in chunks, one transaction per chunk.

use crate::error::{WarehouseError, WarehouseResult};
use crate::rows::TableRows;
use crate::schema::TableDef;
use crate::tables::LOAD_ORDER;
use cw_core::sql_utils::quote_ident;
use cw_db::{Database, SqlValue};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Row accounting of one table load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub input: usize,
    /// Rows without a primary key value
    pub missing_keys: usize,
    /// Rows repeating an already-seen primary key or unique value
    pub duplicates: usize,
    /// Rows whose foreign keys reference no loaded row
    pub orphans: usize,
    pub loaded: usize,
}

/// Per-table stats of a full load, keyed by table name
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub tables: BTreeMap<String, LoadStats>,
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn total_loaded(&self) -> usize {
        self.tables.values().map(|s| s.loaded).sum()
    }

    pub fn loaded(&self, table: &str) -> usize {
        self.tables.get(table).map(|s| s.loaded).unwrap_or(0)
    }
}

/// Drop every star table in reverse load order, then create them in order.
pub async fn create_schema(db: &dyn Database) -> WarehouseResult<()> {
    for def in LOAD_ORDER.iter().rev() {
        db.execute(&def.drop_sql())
            .await
            .map_err(|source| schema_error(def, source))?;
    }
    for def in LOAD_ORDER.iter() {
        db.execute(&def.create_sql())
            .await
            .map_err(|source| schema_error(def, source))?;
        for sql in def.index_sql() {
            db.execute(&sql)
                .await
                .map_err(|source| schema_error(def, source))?;
        }
    }
    info!("Created {} warehouse tables", LOAD_ORDER.len());
    Ok(())
}

fn schema_error(def: &TableDef, source: cw_db::DbError) -> WarehouseError {
    WarehouseError::Schema {
        table: def.name.to_string(),
        source,
    }
}

/// First-seen-wins deduplication on the primary key and every unique column.
///
/// Rows without a primary key are dropped; a NULL unique value never
/// collides.
pub fn dedup(def: &TableDef, rows: Vec<Vec<SqlValue>>, stats: &mut LoadStats) -> Vec<Vec<SqlValue>> {
    let pk = def.column_index(def.primary_key);
    let uniques: Vec<usize> = def
        .unique
        .iter()
        .filter_map(|u| def.column_index(u))
        .collect();

    let mut seen_pk = HashSet::new();
    let mut seen_unique: Vec<HashSet<String>> = vec![HashSet::new(); uniques.len()];
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(pk_value) = pk.and_then(|i| row.get(i)).and_then(SqlValue::as_key) else {
            stats.missing_keys += 1;
            continue;
        };
        if seen_pk.contains(&pk_value) {
            stats.duplicates += 1;
            continue;
        }
        let unique_values: Vec<Option<String>> = uniques
            .iter()
            .map(|&i| row.get(i).and_then(SqlValue::as_key))
            .collect();
        let collides = unique_values
            .iter()
            .zip(&seen_unique)
            .any(|(v, seen)| v.as_ref().is_some_and(|v| seen.contains(v)));
        if collides {
            stats.duplicates += 1;
            continue;
        }

        seen_pk.insert(pk_value);
        for (v, seen) in unique_values.into_iter().zip(seen_unique.iter_mut()) {
            if let Some(v) = v {
                seen.insert(v);
            }
        }
        out.push(row);
    }
    out
}

/// Keep rows whose every foreign key is present in `keys` (per column
/// index). NULL passes only in a nullable column.
pub fn filter_orphans(
    def: &TableDef,
    rows: Vec<Vec<SqlValue>>,
    keys: &HashMap<usize, HashSet<String>>,
    stats: &mut LoadStats,
) -> Vec<Vec<SqlValue>> {
    let checks: Vec<(usize, bool)> = def
        .foreign_keys
        .iter()
        .filter_map(|fk| {
            let idx = def.column_index(fk.column)?;
            Some((idx, def.columns[idx].nullable))
        })
        .collect();

    rows.into_iter()
        .filter(|row| {
            let ok = checks.iter().all(|&(idx, nullable)| {
                match row.get(idx).and_then(SqlValue::as_key) {
                    None => nullable,
                    Some(v) => keys.get(&idx).is_some_and(|set| set.contains(&v)),
                }
            });
            if !ok {
                stats.orphans += 1;
            }
            ok
        })
        .collect()
}

/// Loads star tables through a [`Database`]
pub struct Loader<'a> {
    db: &'a dyn Database,
    chunk_size: usize,
}

impl<'a> Loader<'a> {
    pub fn new(db: &'a dyn Database, chunk_size: usize) -> Self {
        Self {
            db,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Rebuild the schema and load every table in the given order.
    pub async fn load_all(&self, tables: Vec<TableRows>) -> WarehouseResult<LoadReport> {
        create_schema(self.db).await?;
        let mut report = LoadReport::default();
        for table in tables {
            let name = table.def.name;
            let is_fact = table.def.is_fact();
            let stats = self.load_table(table).await?;
            if is_fact && stats.input > 0 && stats.loaded == 0 {
                let message = format!(
                    "{}: all {} rows were dropped ({} duplicates, {} orphans, {} without a key)",
                    name, stats.input, stats.duplicates, stats.orphans, stats.missing_keys
                );
                warn!("{}", message);
                report.warnings.push(message);
            }
            report.tables.insert(name.to_string(), stats);
        }
        Ok(report)
    }

    /// Dedup, FK-filter, truncate and insert one table.
    pub async fn load_table(&self, table: TableRows) -> WarehouseResult<LoadStats> {
        let def = table.def;
        let mut stats = LoadStats {
            input: table.rows.len(),
            ..Default::default()
        };

        for row in &table.rows {
            if row.len() != def.columns.len() {
                return Err(WarehouseError::RowShape {
                    table: def.name.to_string(),
                    expected: def.columns.len(),
                    actual: row.len(),
                });
            }
        }

        let rows = dedup(def, table.rows, &mut stats);
        let keys = self.referenced_keys(def).await?;
        let rows = filter_orphans(def, rows, &keys, &mut stats);

        let load_error = |source| WarehouseError::Load {
            table: def.name.to_string(),
            source,
        };
        self.db
            .execute(&def.truncate_sql())
            .await
            .map_err(load_error)?;

        let columns = def.column_types();
        for chunk in rows.chunks(self.chunk_size) {
            stats.loaded += self
                .db
                .insert_rows(def.name, &columns, chunk)
                .await
                .map_err(load_error)?;
        }

        if stats.duplicates + stats.orphans + stats.missing_keys > 0 {
            warn!(
                "{}: dropped {} duplicates, {} orphans, {} without a key",
                def.name, stats.duplicates, stats.orphans, stats.missing_keys
            );
        }
        debug!("{}: loaded {} of {} rows", def.name, stats.loaded, stats.input);
        Ok(stats)
    }

    /// Keys of every referenced table, read back from the warehouse
    async fn referenced_keys(
        &self,
        def: &TableDef,
    ) -> WarehouseResult<HashMap<usize, HashSet<String>>> {
        let mut keys = HashMap::new();
        for fk in def.foreign_keys {
            let Some(idx) = def.column_index(fk.column) else {
                continue;
            };
            let sql = format!(
                "SELECT {} FROM {}",
                quote_ident(fk.ref_column),
                quote_ident(fk.references)
            );
            let set = self
                .db
                .query_keys(&sql)
                .await
                .map_err(|source| WarehouseError::KeyLookup {
                    table: fk.references.to_string(),
                    column: fk.ref_column.to_string(),
                    source,
                })?;
            keys.insert(idx, set);
        }
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
