//! Student conformance
//!
//! Attributes the sources lack are synthesised from a hash of the student id,
//! so the same snapshot always yields the same students.

use crate::coerce::{rows, Row, INTEGER_RANGE};
use crate::conformer::{Conformer, STUDENTS};
use crate::lookup::{student_key, PROGRAM_REF};
use crate::record::StudentRecord;
use crate::report::ConformReport;
use chrono::Duration;
use cw_core::fingerprint::stable_pick;
use regex::Regex;
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::OnceLock;

const ACCESS_NUMBER: &[&str] = &["AccessNumber", "access_number"];

/// Admission dates are spread over this many days before `as_of`
const ADMISSION_WINDOW_DAYS: u64 = 4 * 365;

/// Access numbers are one of two letters followed by five digits
const ACCESS_SPACE: u64 = 200_000;

static ACCESS_NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn access_number_regex() -> &'static Regex {
    ACCESS_NUMBER_RE.get_or_init(|| Regex::new(r"^[AB]\d{5}$").expect("valid regex"))
}

/// Whether an access number has the `A12345` / `B12345` shape
pub fn is_valid_access_number(value: &str) -> bool {
    access_number_regex().is_match(value)
}

/// Split a full name on its first whitespace run.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Deterministic access number for a student without one, probing past
/// numbers already in use.
fn synthesize_access_number(student_id: &str, taken: &mut HashSet<String>) -> String {
    let mut n = stable_pick(student_id, "access_number", ACCESS_SPACE);
    let mut candidate = String::new();
    for _ in 0..ACCESS_SPACE {
        let letter = if n < ACCESS_SPACE / 2 { 'A' } else { 'B' };
        candidate = format!("{}{:05}", letter, n % (ACCESS_SPACE / 2));
        if taken.insert(candidate.clone()) {
            break;
        }
        n = (n + 1) % ACCESS_SPACE;
    }
    candidate
}

fn names(row: &Row<'_>) -> (String, String) {
    if let Some(full) = row.text(&["FullName", "full_name", "Name"]) {
        return split_full_name(&full);
    }
    (
        row.text(&["FirstName", "first_name"]).unwrap_or_default(),
        row.text(&["LastName", "last_name"]).unwrap_or_default(),
    )
}

pub(crate) fn students(ctx: &Conformer<'_>, report: &mut ConformReport) -> Vec<StudentRecord> {
    let Some(table) = ctx.table(STUDENTS) else {
        report.record("students", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let defaults = &ctx.config.defaults;

    // Source-provided access numbers are reserved before any is synthesised
    let mut taken: HashSet<String> = rows(table, &failures)
        .filter_map(|row| row.text(ACCESS_NUMBER))
        .collect();

    let mut missing_id = 0usize;
    let mut invalid_access = 0usize;
    let mut out = Vec::with_capacity(table.len());

    for row in rows(table, &failures) {
        let Some(student_id) = student_key(&row) else {
            missing_id += 1;
            continue;
        };

        let access_number = match row.text(ACCESS_NUMBER) {
            Some(a) => {
                if !is_valid_access_number(&a) {
                    invalid_access += 1;
                }
                a
            }
            None => synthesize_access_number(&student_id, &mut taken),
        };

        let (first_name, last_name) = names(&row);

        let gender = row
            .text(&["Gender", "gender"])
            .unwrap_or_else(|| match stable_pick(&student_id, "gender", 2) {
                0 => "M".to_string(),
                _ => "F".to_string(),
            });

        let admission_date = row
            .date(&["AdmissionDate", "admission_date"])
            .unwrap_or_else(|| {
                let back = stable_pick(&student_id, "admission_date", ADMISSION_WINDOW_DAYS);
                ctx.as_of - Duration::days(back as i64)
            });

        out.push(StudentRecord {
            reg_no: row
                .text(&["RegNo", "reg_no"])
                .unwrap_or_else(|| student_id.clone()),
            email: row
                .text(&["Email", "email"])
                .unwrap_or_else(|| format!("{}@{}", access_number, defaults.email_domain)),
            access_number,
            first_name,
            last_name,
            gender,
            nationality: row
                .text(&["Nationality", "nationality"])
                .unwrap_or_else(|| defaults.nationality.clone()),
            admission_date,
            high_school: row.text(&["HighSchool", "high_school"]).unwrap_or_default(),
            high_school_district: row
                .text(&["HighSchoolDistrict", "high_school_district"])
                .unwrap_or_default(),
            program_id: row.int(PROGRAM_REF),
            year_of_study: row
                .int_in(&["YearOfStudy", "year_of_study"], INTEGER_RANGE)
                .unwrap_or(1),
            status: row
                .text(&["Status", "status"])
                .unwrap_or_else(|| "Active".to_string()),
            student_id,
        });
    }

    if missing_id > 0 {
        report.warn(format!(
            "students: {} rows without a registration number or student id were skipped",
            missing_id
        ));
    }
    if invalid_access > 0 {
        report.warn(format!(
            "students: {} access numbers do not match the A12345/B12345 pattern",
            invalid_access
        ));
    }
    report.record("students", out.len(), failures.get());
    out
}
