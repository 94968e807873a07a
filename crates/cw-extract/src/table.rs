//! In-memory raw dataset

use cw_db::TextResult;

/// One source table as extracted: native column names, every value as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub source: String,
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(source: &str, table: &str, result: TextResult) -> Self {
        Self {
            source: source.to_string(),
            table: table.to_string(),
            columns: result.columns,
            rows: result.rows,
        }
    }

    /// A table with no columns and no rows
    pub fn empty(source: &str, table: &str) -> Self {
        Self {
            source: source.to_string(),
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// `source.table`
    pub fn key(&self) -> String {
        format!("{}.{}", self.source, self.table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched exactly
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a column in a row; `None` for NULL or a missing column
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}
