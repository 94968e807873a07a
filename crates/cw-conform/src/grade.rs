//! Grade conformance
//!
//! Stored grade fields are always rederived from the raw scores with the
//! policy of the student's program category; a source `TotalScore` or letter
//! is ignored.

use crate::activity::semester_label;
use crate::coerce::{parse_int, rows, SCORE_RANGE};
use crate::conformer::{Conformer, GRADES};
use crate::lookup::KeyMaps;
use crate::record::GradeRecord;
use crate::report::ConformReport;
use cw_core::grading::compute_grade;
use cw_core::semester::semester_for_date;
use cw_core::{semester_id_for, ExamStatus};
use std::cell::Cell;

/// `GRD######` from a numeric source id; other values pass through.
pub fn synth_grade_id(raw: &str) -> String {
    match parse_int(raw) {
        Some(n) => format!("GRD{:06}", n),
        None => raw.trim().to_string(),
    }
}

pub(crate) fn grades(
    ctx: &Conformer<'_>,
    maps: &KeyMaps,
    report: &mut ConformReport,
) -> Vec<GradeRecord> {
    let Some(table) = ctx.table(GRADES) else {
        report.record("grades", 0, 0);
        return Vec::new();
    };
    let failures = Cell::new(0);
    let mut out = Vec::with_capacity(table.len());

    for row in rows(table, &failures) {
        let student_id = maps.resolve_student(&row);
        let policy = ctx.config.grading.policy_for(maps.category_of(&student_id));

        let raw_status = row.text(&["ExamStatus", "exam_status"]).and_then(|s| {
            let parsed = ExamStatus::parse(&s);
            if parsed.is_none() {
                failures.set(failures.get() + 1);
            }
            parsed
        });
        let outcome = compute_grade(
            policy,
            row.number_in(&["CourseworkScore", "coursework_score"], SCORE_RANGE)
                .unwrap_or(0.0),
            row.number_in(&["ExamScore", "exam_score"], SCORE_RANGE),
            raw_status,
        );

        let exam_date = row
            .date(&["ExamDate", "exam_date"])
            .unwrap_or(ctx.as_of);
        let semester_id = match semester_label(&row) {
            Some(label) => semester_id_for(&label),
            None => semester_for_date(exam_date).id,
        };

        out.push(GradeRecord {
            grade_id: row
                .text(&["GradeID", "grade_id"])
                .map(|id| synth_grade_id(&id))
                .unwrap_or_else(|| synth_grade_id(&(row.index() + 1).to_string())),
            course_code: maps.resolve_course(&row),
            student_id,
            exam_date,
            semester_id,
            coursework_score: outcome.coursework_score,
            exam_score: outcome.exam_score,
            grade: outcome.grade,
            letter_grade: outcome.letter_grade.to_string(),
            fcw: outcome.fcw,
            exam_status: outcome.exam_status,
            absence_reason: row.text(&["AbsenceReason", "absence_reason"]),
        });
    }

    if !out.is_empty() {
        for status in [ExamStatus::Mex, ExamStatus::Fex, ExamStatus::Fcw] {
            if !out.iter().any(|g| g.exam_status == status) {
                report.warn(format!("grades: no rows with exam status {}", status));
            }
        }
    }
    report.record("grades", out.len(), failures.get());
    out
}
