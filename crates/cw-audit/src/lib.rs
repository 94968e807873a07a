//! cw-audit - Post-load integrity audit for the campus warehouse
//!
//! Checks are generated from the star-schema definitions plus a set of
//! domain invariants, then run as queries returning offending rows.

pub mod generator;
pub mod runner;

pub use generator::{
    star_checks, table_checks, AuditCheck, AuditError, AuditResult, CheckKind, Severity,
};
pub use runner::{AuditRunner, AuditSummary, CheckResult};
