//! Audit check SQL generation
//!
//! Every generated query returns the offending rows; an empty result passes.

use cw_core::sql_utils::{escape_sql_string, quote_ident};
use cw_core::{ExamStatus, MilestoneKind};
use cw_warehouse::tables::{DIM_STUDENT, FACT_GRADE, FACT_PAYMENT};
use cw_warehouse::{TableDef, LOAD_ORDER};
use serde::Serialize;
use thiserror::Error;

/// Audit errors
#[derive(Error, Debug)]
pub enum AuditError {
    /// Bound is NaN or infinite (A001)
    #[error("[A001] invalid bound for {table}.{column}: {value}")]
    InvalidBound {
        table: String,
        column: String,
        value: f64,
    },

    /// Warehouse table absent, the warehouse has not been loaded (A002)
    #[error("[A002] Warehouse table '{0}' does not exist; run the pipeline first")]
    MissingTable(String),

    /// Database error while inspecting the warehouse (A003)
    #[error("[A003] {0}")]
    Db(#[from] cw_db::DbError),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Letters a stored grade may carry
pub const LETTER_GRADES: &[&str] = &["A", "B+", "B", "C", "D", "F", "MEX", "FEX", "FCW"];

pub fn generate_unique_check(table: &str, column: &str) -> String {
    let qt = quote_ident(table);
    let qc = quote_ident(column);
    format!("SELECT {qc}, COUNT(*) AS cnt\nFROM {qt}\nWHERE {qc} IS NOT NULL\nGROUP BY {qc}\nHAVING COUNT(*) > 1")
}

pub fn generate_not_null_check(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} IS NULL",
        quote_ident(table),
        quote_ident(column)
    )
}

/// Rows whose non-null `column` has no match in `ref_table.ref_column`
pub fn generate_relationship_check(
    table: &str,
    column: &str,
    ref_table: &str,
    ref_column: &str,
) -> String {
    let qt = quote_ident(table);
    let qc = quote_ident(column);
    let qrt = quote_ident(ref_table);
    let qrc = quote_ident(ref_column);
    format!(
        "SELECT src.{qc}\n\
         FROM {qt} AS src\n\
         WHERE src.{qc} IS NOT NULL\n\
         \x20 AND NOT EXISTS (\n\
         \x20   SELECT 1 FROM {qrt} AS ref_tbl\n\
         \x20   WHERE ref_tbl.{qrc} = src.{qc}\n\
         \x20 )"
    )
}

/// Rows whose value is outside `values`; NULL fails unless `allow_null`.
pub fn generate_accepted_values_check(
    table: &str,
    column: &str,
    values: &[&str],
    allow_null: bool,
) -> String {
    let list = values
        .iter()
        .map(|v| format!("'{}'", escape_sql_string(v)))
        .collect::<Vec<_>>()
        .join(", ");
    let qt = quote_ident(table);
    let qc = quote_ident(column);
    if allow_null {
        format!("SELECT * FROM {qt} WHERE {qc} NOT IN ({list})")
    } else {
        format!("SELECT * FROM {qt} WHERE {qc} NOT IN ({list}) OR {qc} IS NULL")
    }
}

/// Rows whose value lies outside `[min, max]`
pub fn generate_range_check(
    table: &str,
    column: &str,
    min: f64,
    max: f64,
) -> AuditResult<String> {
    for value in [min, max] {
        if !value.is_finite() {
            return Err(AuditError::InvalidBound {
                table: table.to_string(),
                column: column.to_string(),
                value,
            });
        }
    }
    Ok(format!(
        "SELECT * FROM {} WHERE {} < {} OR {} > {}",
        quote_ident(table),
        quote_ident(column),
        min,
        quote_ident(column),
        max
    ))
}

/// Rows whose value is negative
pub fn generate_non_negative_check(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} < 0",
        quote_ident(table),
        quote_ident(column)
    )
}

pub fn generate_pattern_check(table: &str, column: &str, pattern: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE NOT regexp_matches({}, '{}')",
        quote_ident(table),
        quote_ident(column),
        escape_sql_string(pattern)
    )
}

/// Rows of `table` violating a boolean `invariant`
pub fn generate_invariant_check(table: &str, invariant: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE NOT ({})",
        quote_ident(table),
        invariant
    )
}

/// Kind of an audit check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CheckKind {
    Unique,
    NotNull,
    Relationship { to: String, field: String },
    AcceptedValues { values: Vec<String> },
    Range { min: f64, max: f64 },
    NonNegative,
    Pattern { pattern: String },
    Invariant { expression: String },
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Unique => "unique",
            CheckKind::NotNull => "not_null",
            CheckKind::Relationship { .. } => "relationship",
            CheckKind::AcceptedValues { .. } => "accepted_values",
            CheckKind::Range { .. } => "range",
            CheckKind::NonNegative => "non_negative",
            CheckKind::Pattern { .. } => "pattern",
            CheckKind::Invariant { .. } => "invariant",
        }
    }
}

/// Whether a failing check fails the audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warn,
}

/// A check with its generated SQL
#[derive(Debug, Clone, Serialize)]
pub struct AuditCheck {
    pub name: String,
    pub table: String,
    pub column: String,
    pub kind: CheckKind,
    pub severity: Severity,
    #[serde(skip)]
    pub sql: String,
}

impl AuditCheck {
    fn new(table: &str, column: &str, kind: CheckKind, sql: String) -> Self {
        Self {
            name: format!("{}_{}_{}", kind.label(), table, column),
            table: table.to_string(),
            column: column.to_string(),
            kind,
            severity: Severity::Error,
            sql,
        }
    }

    pub fn unique(table: &str, column: &str) -> Self {
        Self::new(table, column, CheckKind::Unique, generate_unique_check(table, column))
    }

    pub fn not_null(table: &str, column: &str) -> Self {
        Self::new(table, column, CheckKind::NotNull, generate_not_null_check(table, column))
    }

    pub fn relationship(table: &str, column: &str, to: &str, field: &str) -> Self {
        Self::new(
            table,
            column,
            CheckKind::Relationship {
                to: to.to_string(),
                field: field.to_string(),
            },
            generate_relationship_check(table, column, to, field),
        )
    }

    pub fn accepted_values(table: &str, column: &str, values: &[&str], allow_null: bool) -> Self {
        Self::new(
            table,
            column,
            CheckKind::AcceptedValues {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
            generate_accepted_values_check(table, column, values, allow_null),
        )
    }

    pub fn range(table: &str, column: &str, min: f64, max: f64) -> AuditResult<Self> {
        Ok(Self::new(
            table,
            column,
            CheckKind::Range { min, max },
            generate_range_check(table, column, min, max)?,
        ))
    }

    pub fn non_negative(table: &str, column: &str) -> Self {
        Self::new(
            table,
            column,
            CheckKind::NonNegative,
            generate_non_negative_check(table, column),
        )
    }

    pub fn pattern(table: &str, column: &str, pattern: &str) -> Self {
        Self::new(
            table,
            column,
            CheckKind::Pattern {
                pattern: pattern.to_string(),
            },
            generate_pattern_check(table, column, pattern),
        )
    }

    /// `label` names the invariant in place of a column
    pub fn invariant(table: &str, label: &str, expression: &str) -> Self {
        Self::new(
            table,
            label,
            CheckKind::Invariant {
                expression: expression.to_string(),
            },
            generate_invariant_check(table, expression),
        )
    }

    pub fn warn_only(mut self) -> Self {
        self.severity = Severity::Warn;
        self
    }
}

/// Key checks derived from a table definition: primary key, unique columns,
/// required columns and foreign keys.
pub fn table_checks(def: &TableDef) -> Vec<AuditCheck> {
    let mut checks = vec![
        AuditCheck::unique(def.name, def.primary_key),
        AuditCheck::not_null(def.name, def.primary_key),
    ];
    checks.extend(def.unique.iter().map(|c| AuditCheck::unique(def.name, c)));
    checks.extend(
        def.columns
            .iter()
            .filter(|c| !c.nullable && c.name != def.primary_key)
            .map(|c| AuditCheck::not_null(def.name, c.name)),
    );
    checks.extend(
        def.foreign_keys
            .iter()
            .map(|fk| AuditCheck::relationship(def.name, fk.column, fk.references, fk.ref_column)),
    );
    checks
}

/// Every check of the star schema
pub fn star_checks() -> AuditResult<Vec<AuditCheck>> {
    let mut checks: Vec<AuditCheck> = LOAD_ORDER.iter().flat_map(|def| table_checks(def)).collect();

    let grade = FACT_GRADE.name;
    let statuses: Vec<&str> = ExamStatus::ALL.iter().map(|s| s.as_str()).collect();
    checks.push(AuditCheck::accepted_values(grade, "exam_status", &statuses, false));
    checks.push(AuditCheck::accepted_values(grade, "letter_grade", LETTER_GRADES, false));
    for column in ["coursework_score", "exam_score", "grade"] {
        checks.push(AuditCheck::range(grade, column, 0.0, 100.0)?);
    }
    checks.push(AuditCheck::invariant(
        grade,
        "mex_without_exam",
        "exam_status <> 'MEX' OR exam_score IS NULL",
    ));
    checks.push(AuditCheck::invariant(
        grade,
        "fcw_status",
        "fcw = (exam_status = 'FCW')",
    ));

    let payment = FACT_PAYMENT.name;
    let milestones: Vec<&str> = MilestoneKind::ALL.iter().map(|k| k.as_str()).collect();
    checks.push(AuditCheck::accepted_values(payment, "deadline_type", &milestones, true));
    checks.push(AuditCheck::accepted_values(
        payment,
        "student_type",
        &["national", "international"],
        false,
    ));
    for column in ["amount", "late_penalty"] {
        checks.push(AuditCheck::non_negative(payment, column));
    }
    checks.push(AuditCheck::invariant(
        payment,
        "penalty_only_when_late",
        "late_penalty = 0 OR NOT deadline_met",
    ));

    checks.push(AuditCheck::pattern(DIM_STUDENT.name, "access_number", r"^[AB]\d{5}$").warn_only());
    Ok(checks)
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
