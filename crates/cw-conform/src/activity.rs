//! Enrollment and attendance conformance

use crate::coerce::{has_any, rows, Row};
use crate::conformer::{Conformer, ATTENDANCE, ENROLLMENTS};
use crate::lookup::KeyMaps;
use crate::record::{AttendanceRecord, EnrollmentRecord};
use crate::report::ConformReport;
use cw_core::semester_id_for;
use std::cell::Cell;

const ATTENDANCE_STATUS: &[&str] = &["Status", "status", "AttendanceStatus"];

/// Hours credited for one attendance mark
pub fn attendance_hours(status: Option<&str>) -> f64 {
    match status.map(|s| s.trim().to_uppercase()) {
        None => 2.0,
        Some(s) if s == "PRESENT" => 2.0,
        Some(s) if s == "LATE" => 1.0,
        Some(_) => 0.0,
    }
}

/// Free-text semester label of a row: `AcademicYear Semester`, or a single
/// semester column
pub(crate) fn semester_label(row: &Row<'_>) -> Option<String> {
    let year = row.text(&["AcademicYear", "academic_year"]);
    let semester = row.text(&["Semester", "semester"]);
    match (year, semester) {
        (Some(y), Some(s)) => Some(format!("{} {}", y, s)),
        (None, Some(s)) => Some(s),
        (Some(y), None) => Some(y),
        (None, None) => None,
    }
}

pub(crate) fn enrollments(
    ctx: &Conformer<'_>,
    maps: &KeyMaps,
    report: &mut ConformReport,
) -> Vec<EnrollmentRecord> {
    let Some(table) = ctx.table(ENROLLMENTS) else {
        report.record("enrollments", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let out: Vec<_> = rows(table, &failures)
        .map(|row| EnrollmentRecord {
            enrollment_id: row
                .text(&["EnrollmentID", "enrollment_id"])
                .unwrap_or_else(|| (row.index() + 1).to_string()),
            student_id: maps.resolve_student(&row),
            course_code: maps.resolve_course(&row),
            enrollment_date: row
                .date(&["EnrollmentDate", "enrollment_date"])
                .unwrap_or(ctx.as_of),
            semester_id: semester_id_for(&semester_label(&row).unwrap_or_default()),
            status: row
                .text(&["Status", "status"])
                .unwrap_or_else(|| "Active".to_string()),
        })
        .collect();
    report.record("enrollments", out.len(), failures.get());
    out
}

pub(crate) fn attendance(
    ctx: &Conformer<'_>,
    maps: &KeyMaps,
    report: &mut ConformReport,
) -> Vec<AttendanceRecord> {
    let Some(table) = ctx.table(ATTENDANCE) else {
        report.record("attendance", 0, 0);
        return Vec::new();
    };
    let has_status = has_any(table, ATTENDANCE_STATUS);
    let failures = Cell::new(0);
    let out: Vec<_> = rows(table, &failures)
        .map(|row| {
            let status = row.text(ATTENDANCE_STATUS);
            let hours = if has_status {
                attendance_hours(Some(status.as_deref().unwrap_or("")))
            } else {
                attendance_hours(None)
            };
            AttendanceRecord {
                student_id: maps.resolve_student(&row),
                course_code: maps.resolve_course(&row),
                attendance_date: row.date(&["Date", "AttendanceDate", "attendance_date"]),
                hours,
            }
        })
        .collect();

    let undated = out.iter().filter(|a| a.attendance_date.is_none()).count();
    if undated > 0 {
        report.warn(format!(
            "attendance: {} marks have no usable date and cannot be loaded",
            undated
        ));
    }
    report.record("attendance", out.len(), failures.get());
    out
}
