//! Natural-key resolution for students and courses.
//!
//! Fact tables reference students and courses by source surrogate ids
//! (`StudentID`, `CourseID`). These resolve through maps built from the
//! raw student and course tables of the same extract; when the join target
//! is unavailable the synthesised `STU######` / `COURSE###` pattern is used.

use crate::coerce::{parse_int, rows, Row};
use cw_core::{Config, ProgramCategory};
use cw_extract::RawTable;
use std::cell::Cell;
use std::collections::HashMap;

pub(crate) const STUDENT_REF: &[&str] = &["StudentID", "student_ref"];
pub(crate) const STUDENT_KEY: &[&str] = &["RegNo", "reg_no", "registration_number"];
pub(crate) const STUDENT_CANONICAL: &[&str] = &["student_id"];
pub(crate) const COURSE_REF: &[&str] = &["CourseID", "course_ref"];
pub(crate) const COURSE_KEY: &[&str] = &["CourseCode", "course_code"];
pub(crate) const PROGRAM_REF: &[&str] = &["ProgramID", "program_id"];

/// `STU######` from a numeric source id; other values pass through.
pub fn synth_student_id(raw: &str) -> String {
    match parse_int(raw) {
        Some(n) => format!("STU{:06}", n),
        None => raw.trim().to_string(),
    }
}

/// `COURSE###` from a numeric source id; other values pass through.
pub fn synth_course_code(raw: &str) -> String {
    match parse_int(raw) {
        Some(n) => format!("COURSE{:03}", n),
        None => raw.trim().to_string(),
    }
}

/// Canonical student id of a row of the students table
pub(crate) fn student_key(row: &Row<'_>) -> Option<String> {
    row.text(STUDENT_KEY)
        .or_else(|| row.text(STUDENT_REF).map(|id| synth_student_id(&id)))
        .or_else(|| row.text(STUDENT_CANONICAL))
}

/// Canonical course code of a row of the courses table
pub(crate) fn course_key(row: &Row<'_>) -> Option<String> {
    row.text(COURSE_KEY)
        .or_else(|| row.text(COURSE_REF).map(|id| synth_course_code(&id)))
}

/// Source-id lookups built once per run
#[derive(Debug, Default)]
pub struct KeyMaps {
    students: HashMap<String, String>,
    courses: HashMap<String, String>,
    student_category: HashMap<String, ProgramCategory>,
}

impl KeyMaps {
    pub fn build(
        config: &Config,
        students: Option<&RawTable>,
        courses: Option<&RawTable>,
        programs: Option<&RawTable>,
    ) -> Self {
        let failures = Cell::new(0);
        let mut maps = KeyMaps::default();

        let mut program_category = HashMap::new();
        if let Some(programs) = programs {
            for row in rows(programs, &failures) {
                if let (Some(id), Some(name)) =
                    (row.text(PROGRAM_REF), row.text(&["ProgramName", "program_name"]))
                {
                    program_category.insert(id, config.grading.category_of(&name));
                }
            }
        }

        if let Some(students) = students {
            for row in rows(students, &failures) {
                let Some(key) = student_key(&row) else {
                    continue;
                };
                if let Some(source_id) = row.text(STUDENT_REF) {
                    maps.students.entry(source_id).or_insert_with(|| key.clone());
                }
                if let Some(category) = row
                    .text(PROGRAM_REF)
                    .and_then(|p| program_category.get(&p).copied())
                {
                    maps.student_category.entry(key).or_insert(category);
                }
            }
        }

        if let Some(courses) = courses {
            for row in rows(courses, &failures) {
                if let (Some(source_id), Some(key)) = (row.text(COURSE_REF), course_key(&row)) {
                    maps.courses.entry(source_id).or_insert(key);
                }
            }
        }

        maps
    }

    /// Student id referenced by a fact row
    pub fn resolve_student(&self, row: &Row<'_>) -> String {
        if let Some(key) = row.text(STUDENT_KEY) {
            return key;
        }
        if let Some(source_id) = row.text(STUDENT_REF) {
            return self
                .students
                .get(&source_id)
                .cloned()
                .unwrap_or_else(|| synth_student_id(&source_id));
        }
        row.text(STUDENT_CANONICAL).unwrap_or_default()
    }

    /// Course code referenced by a fact row
    pub fn resolve_course(&self, row: &Row<'_>) -> String {
        if let Some(code) = row.text(COURSE_KEY) {
            return code;
        }
        row.text(COURSE_REF)
            .map(|source_id| {
                self.courses
                    .get(&source_id)
                    .cloned()
                    .unwrap_or_else(|| synth_course_code(&source_id))
            })
            .unwrap_or_default()
    }

    /// Program category of a student, default when unknown
    pub fn category_of(&self, student_id: &str) -> ProgramCategory {
        self.student_category
            .get(student_id)
            .copied()
            .unwrap_or_default()
    }
}
