//! Faculty, department and program conformance (1:1 renames)

use crate::coerce::{rows, INTEGER_RANGE};
use crate::conformer::{Conformer, DEPARTMENTS, FACULTIES, PROGRAMS};
use crate::record::{DepartmentRecord, FacultyRecord, ProgramRecord};
use crate::report::ConformReport;
use std::cell::Cell;

pub(crate) fn faculties(ctx: &Conformer<'_>, report: &mut ConformReport) -> Vec<FacultyRecord> {
    let Some(table) = ctx.table(FACULTIES) else {
        report.record("faculties", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let out: Vec<_> = rows(table, &failures)
        .map(|row| FacultyRecord {
            faculty_id: row.int(&["FacultyID", "faculty_id"]),
            faculty_name: row.text(&["FacultyName", "faculty_name"]).unwrap_or_default(),
            dean_name: row.text(&["DeanName", "dean_name"]).unwrap_or_default(),
        })
        .collect();
    report.record("faculties", out.len(), failures.get());
    out
}

pub(crate) fn departments(
    ctx: &Conformer<'_>,
    report: &mut ConformReport,
) -> Vec<DepartmentRecord> {
    let Some(table) = ctx.table(DEPARTMENTS) else {
        report.record("departments", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let out: Vec<_> = rows(table, &failures)
        .map(|row| DepartmentRecord {
            department_id: row.int(&["DepartmentID", "department_id"]),
            department_name: row
                .text(&["DepartmentName", "department_name"])
                .unwrap_or_default(),
            faculty_id: row.int(&["FacultyID", "faculty_id"]),
            head_of_department: row
                .text(&["HeadOfDepartment", "head_of_department"])
                .unwrap_or_default(),
        })
        .collect();
    report.record("departments", out.len(), failures.get());
    out
}

pub(crate) fn programs(ctx: &Conformer<'_>, report: &mut ConformReport) -> Vec<ProgramRecord> {
    let Some(table) = ctx.table(PROGRAMS) else {
        report.record("programs", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let out: Vec<_> = rows(table, &failures)
        .map(|row| {
            let program_name = row.text(&["ProgramName", "program_name"]).unwrap_or_default();
            ProgramRecord {
                program_id: row.int(&["ProgramID", "program_id"]),
                category: ctx.config.grading.category_of(&program_name),
                program_name,
                degree_level: row.text(&["DegreeLevel", "degree_level"]).unwrap_or_default(),
                department_id: row.int(&["DepartmentID", "department_id"]),
                duration_years: row
                    .int_in(&["DurationYears", "duration_years"], INTEGER_RANGE)
                    .unwrap_or(0),
            }
        })
        .collect();
    report.record("programs", out.len(), failures.get());
    out
}
