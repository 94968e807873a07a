//! Audit execution

use crate::generator::{AuditCheck, AuditError, AuditResult, Severity};
use cw_db::Database;
use cw_warehouse::LOAD_ORDER;
use log::{debug, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub table: String,
    pub column: String,
    pub severity: Severity,
    pub passed: bool,
    /// Number of offending rows (0 if passed)
    pub failure_count: usize,
    /// Up to five offending rows, formatted
    pub sample_failures: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
    /// Query error, if the check could not run
    pub error: Option<String>,
}

impl CheckResult {
    fn new(check: &AuditCheck, duration: Duration) -> Self {
        Self {
            name: check.name.clone(),
            table: check.table.clone(),
            column: check.column.clone(),
            severity: check.severity,
            passed: true,
            failure_count: 0,
            sample_failures: Vec::new(),
            duration,
            error: None,
        }
    }

    pub fn pass(check: &AuditCheck, duration: Duration) -> Self {
        Self::new(check, duration)
    }

    pub fn fail(
        check: &AuditCheck,
        failure_count: usize,
        sample_failures: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            passed: false,
            failure_count,
            sample_failures,
            ..Self::new(check, duration)
        }
    }

    pub fn error(check: &AuditCheck, error: String, duration: Duration) -> Self {
        Self {
            passed: false,
            error: Some(error),
            ..Self::new(check, duration)
        }
    }

    /// Whether this result fails the audit
    pub fn is_blocking(&self) -> bool {
        !self.passed && (self.error.is_some() || self.severity == Severity::Error)
    }
}

/// Summary of an audit run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed checks of warn severity
    pub warned: usize,
    pub errors: usize,
    pub duration_ms: u64,
    /// Names of the blocking checks
    pub failures: Vec<String>,
}

impl AuditSummary {
    pub fn from_results(results: &[CheckResult], duration: Duration) -> Self {
        let failing = |r: &&CheckResult| !r.passed && r.error.is_none();
        Self {
            total: results.len(),
            passed: results.iter().filter(|r| r.passed).count(),
            failed: results
                .iter()
                .filter(failing)
                .filter(|r| r.severity == Severity::Error)
                .count(),
            warned: results
                .iter()
                .filter(failing)
                .filter(|r| r.severity == Severity::Warn)
                .count(),
            errors: results.iter().filter(|r| r.error.is_some()).count(),
            duration_ms: duration.as_millis() as u64,
            failures: results
                .iter()
                .filter(|r| r.is_blocking())
                .map(|r| r.name.clone())
                .collect(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Runs audit checks against the warehouse
pub struct AuditRunner<'a> {
    db: &'a dyn Database,
}

impl<'a> AuditRunner<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Fail unless every star table exists
    pub async fn ensure_schema(&self) -> AuditResult<()> {
        for def in LOAD_ORDER.iter() {
            if !self.db.relation_exists(def.name).await? {
                return Err(AuditError::MissingTable(def.name.to_string()));
            }
        }
        Ok(())
    }

    pub async fn run_check(&self, check: &AuditCheck) -> CheckResult {
        let start = Instant::now();
        match self.db.query_count(&check.sql).await {
            Ok(0) => CheckResult::pass(check, start.elapsed()),
            Ok(count) => {
                let sample_failures = self
                    .db
                    .query_sample_rows(&check.sql, 5)
                    .await
                    .unwrap_or_default();
                CheckResult::fail(check, count, sample_failures, start.elapsed())
            }
            Err(e) => CheckResult::error(check, e.to_string(), start.elapsed()),
        }
    }

    /// Run checks in order; with `fail_fast`, stop after the first blocking
    /// failure.
    pub async fn run_all(
        &self,
        checks: &[AuditCheck],
        fail_fast: bool,
    ) -> (Vec<CheckResult>, AuditSummary) {
        let start = Instant::now();
        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            let result = self.run_check(check).await;
            if result.passed {
                debug!("audit {} passed", result.name);
            } else {
                warn!(
                    "audit {} failed: {}",
                    result.name,
                    result
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("{} offending rows", result.failure_count))
                );
            }
            let stop = fail_fast && result.is_blocking();
            results.push(result);
            if stop {
                break;
            }
        }
        let summary = AuditSummary::from_results(&results, start.elapsed());
        (results, summary)
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
