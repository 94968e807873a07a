//! Course catalogue conformance

use crate::coerce::{rows, INTEGER_RANGE};
use crate::conformer::{Conformer, COURSES, DEPARTMENTS};
use crate::lookup::course_key;
use crate::record::CourseRecord;
use crate::report::ConformReport;
use std::cell::Cell;
use std::collections::HashMap;

/// Department names by source id, for courses that only carry the id
fn department_names(ctx: &Conformer<'_>) -> HashMap<String, String> {
    let failures = Cell::new(0);
    ctx.table(DEPARTMENTS)
        .map(|table| {
            rows(table, &failures)
                .filter_map(|row| {
                    Some((
                        row.text(&["DepartmentID", "department_id"])?,
                        row.text(&["DepartmentName", "department_name"])?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn courses(ctx: &Conformer<'_>, report: &mut ConformReport) -> Vec<CourseRecord> {
    let Some(table) = ctx.table(COURSES) else {
        report.record("courses", 0, 0);
        return Vec::new();
    };
    let departments = department_names(ctx);
    let failures = Cell::new(0);
    let mut missing_code = 0usize;
    let mut out = Vec::with_capacity(table.len());

    for row in rows(table, &failures) {
        let Some(course_code) = course_key(&row) else {
            missing_code += 1;
            continue;
        };
        let department = row
            .text(&["Department", "department"])
            .or_else(|| {
                row.text(&["DepartmentID", "department_id"])
                    .and_then(|id| departments.get(&id).cloned())
            })
            .unwrap_or_else(|| ctx.config.defaults.department.clone());

        out.push(CourseRecord {
            course_code,
            course_name: row.text(&["CourseName", "course_name"]).unwrap_or_default(),
            credits: row
                .int_in(&["CreditUnits", "Credits", "credits"], INTEGER_RANGE)
                .unwrap_or(0),
            department,
        });
    }

    if missing_code > 0 {
        report.warn(format!(
            "courses: {} rows without a course code or id were skipped",
            missing_code
        ));
    }
    report.record("courses", out.len(), failures.get());
    out
}
