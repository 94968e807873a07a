//! Data-quality report of the conform stage

use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

/// Row counts, coercion defaults and data-quality warnings per entity
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConformReport {
    /// Conformed rows per entity
    pub rows: BTreeMap<String, usize>,
    /// Present values that failed conversion and were defaulted, per entity
    pub coerced: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

impl ConformReport {
    pub fn record(&mut self, entity: &str, rows: usize, coerced: usize) {
        self.rows.insert(entity.to_string(), rows);
        if coerced > 0 {
            warn!("{}: {} values could not be converted and were defaulted", entity, coerced);
            *self.coerced.entry(entity.to_string()).or_default() += coerced;
        }
    }

    pub fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn total_coerced(&self) -> usize {
        self.coerced.values().sum()
    }
}
