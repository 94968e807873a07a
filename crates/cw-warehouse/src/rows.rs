//! Gold row builders
//!
//! Each builder renders conformed records as parameter rows in the column
//! order of its table definition.

use crate::schema::TableDef;
use crate::tables::*;
use chrono::{NaiveDate, NaiveDateTime};
use cw_conform::{AttendanceRecord, SilverData};
use cw_core::calendar::{academic_year_label, date_key, days_between};
use cw_core::numeric::round2;
use cw_core::{Config, DayParts, SEMESTERS};
use cw_db::SqlValue;
use std::collections::BTreeMap;

/// Rows destined for one star table
#[derive(Debug, Clone)]
pub struct TableRows {
    pub def: &'static TableDef,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TableRows {
    pub fn new(def: &'static TableDef, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { def, rows }
    }
}

fn date(d: NaiveDate) -> SqlValue {
    SqlValue::Text(d.format("%Y-%m-%d").to_string())
}

fn opt_date(d: Option<NaiveDate>) -> SqlValue {
    d.map(date).unwrap_or(SqlValue::Null)
}

fn timestamp(ts: Option<NaiveDateTime>) -> SqlValue {
    ts.map(|t| SqlValue::Text(t.format("%Y-%m-%d %H:%M:%S").to_string()))
        .unwrap_or(SqlValue::Null)
}

fn key(d: NaiveDate) -> SqlValue {
    SqlValue::Text(date_key(d))
}

/// Build the rows of every star table, in load order.
pub fn build_star(data: &SilverData, config: &Config, as_of: NaiveDate) -> Vec<TableRows> {
    vec![
        TableRows::new(&DIM_FACULTY, faculty_rows(data)),
        TableRows::new(&DIM_DEPARTMENT, department_rows(data)),
        TableRows::new(&DIM_PROGRAM, program_rows(data)),
        TableRows::new(&DIM_STUDENT, student_rows(data)),
        TableRows::new(&DIM_COURSE, course_rows(data)),
        TableRows::new(&DIM_SEMESTER, semester_rows(as_of)),
        TableRows::new(&DIM_TIME, time_rows(config.calendar.start, config.calendar.end)),
        TableRows::new(&FACT_ENROLLMENT, enrollment_rows(data)),
        TableRows::new(&FACT_ATTENDANCE, attendance_rows(&data.attendance)),
        TableRows::new(&FACT_PAYMENT, payment_rows(data)),
        TableRows::new(&FACT_GRADE, grade_rows(data)),
    ]
}

fn faculty_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.faculties
        .iter()
        .map(|f| {
            vec![
                f.faculty_id.into(),
                f.faculty_name.as_str().into(),
                f.dean_name.as_str().into(),
            ]
        })
        .collect()
}

fn department_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.departments
        .iter()
        .map(|d| {
            vec![
                d.department_id.into(),
                d.department_name.as_str().into(),
                d.faculty_id.into(),
                d.head_of_department.as_str().into(),
            ]
        })
        .collect()
}

fn program_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.programs
        .iter()
        .map(|p| {
            vec![
                p.program_id.into(),
                p.program_name.as_str().into(),
                p.degree_level.as_str().into(),
                p.department_id.into(),
                p.duration_years.into(),
            ]
        })
        .collect()
}

fn student_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.students
        .iter()
        .map(|s| {
            vec![
                s.student_id.as_str().into(),
                s.reg_no.as_str().into(),
                s.access_number.as_str().into(),
                s.first_name.as_str().into(),
                s.last_name.as_str().into(),
                s.email.as_str().into(),
                s.gender.as_str().into(),
                s.nationality.as_str().into(),
                date(s.admission_date),
                s.high_school.as_str().into(),
                s.high_school_district.as_str().into(),
                s.program_id.into(),
                s.year_of_study.into(),
                s.status.as_str().into(),
            ]
        })
        .collect()
}

fn course_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.courses
        .iter()
        .map(|c| {
            vec![
                c.course_code.as_str().into(),
                c.course_name.as_str().into(),
                c.credits.into(),
                c.department.as_str().into(),
            ]
        })
        .collect()
}

/// The three intakes, labelled with the academic year containing `as_of`
pub fn semester_rows(as_of: NaiveDate) -> Vec<Vec<SqlValue>> {
    let academic_year = academic_year_label(as_of);
    SEMESTERS
        .iter()
        .map(|s| {
            vec![
                s.id.into(),
                s.name.into(),
                academic_year.as_str().into(),
            ]
        })
        .collect()
}

/// One row per day of the calendar horizon, inclusive
pub fn time_rows(start: NaiveDate, end: NaiveDate) -> Vec<Vec<SqlValue>> {
    days_between(start, end)
        .map(|d| {
            let p = DayParts::of(d);
            vec![
                p.date_key.into(),
                date(p.date),
                i64::from(p.year).into(),
                i64::from(p.quarter).into(),
                i64::from(p.month).into(),
                p.month_name.into(),
                i64::from(p.day).into(),
                i64::from(p.day_of_week).into(),
                p.day_name.into(),
                p.is_weekend.into(),
            ]
        })
        .collect()
}

fn enrollment_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.enrollments
        .iter()
        .map(|e| {
            vec![
                e.enrollment_id.as_str().into(),
                e.student_id.as_str().into(),
                e.course_code.as_str().into(),
                key(e.enrollment_date),
                e.semester_id.into(),
                e.status.as_str().into(),
            ]
        })
        .collect()
}

/// Marks aggregated per student, course and day. `days_present` is 1 when
/// any mark of the day earned hours, so it sums to calendar days. Ids are
/// assigned in key order, so the same marks always produce the same rows.
/// Undated marks keep a NULL date key and are rejected by the foreign-key
/// filter.
pub fn attendance_rows(marks: &[AttendanceRecord]) -> Vec<Vec<SqlValue>> {
    let mut groups: BTreeMap<(&str, &str, Option<String>), (f64, bool)> = BTreeMap::new();
    for mark in marks {
        let entry = groups
            .entry((
                mark.student_id.as_str(),
                mark.course_code.as_str(),
                mark.attendance_date.map(date_key),
            ))
            .or_default();
        entry.0 += mark.hours;
        entry.1 |= mark.hours > 0.0;
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, ((student, course, day), (hours, present)))| {
            vec![
                (i as i64 + 1).into(),
                student.into(),
                course.into(),
                day.into(),
                round2(hours).into(),
                i64::from(present).into(),
            ]
        })
        .collect()
}

fn payment_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.payments
        .iter()
        .map(|p| {
            let deadline = p.deadline.as_ref();
            vec![
                p.payment_id.as_str().into(),
                p.student_id.as_str().into(),
                p.payment_date.map(date_key).into(),
                p.semester_id.into(),
                p.year.into(),
                p.tuition_national.into(),
                p.tuition_international.into(),
                p.functional_fees.into(),
                p.amount.into(),
                p.payment_method.as_str().into(),
                p.status.as_str().into(),
                p.student_type.as_str().into(),
                timestamp(p.payment_timestamp),
                opt_date(p.semester_start_date),
                deadline.is_some_and(|d| d.met).into(),
                deadline.map(|d| d.milestone_type.as_str()).into(),
                deadline.map(|d| d.weeks_from_deadline).into(),
                deadline.map(|d| d.penalty_amount).unwrap_or(0.0).into(),
            ]
        })
        .collect()
}

fn grade_rows(data: &SilverData) -> Vec<Vec<SqlValue>> {
    data.grades
        .iter()
        .map(|g| {
            vec![
                g.grade_id.as_str().into(),
                g.student_id.as_str().into(),
                g.course_code.as_str().into(),
                key(g.exam_date),
                g.semester_id.into(),
                g.coursework_score.into(),
                g.exam_score.into(),
                g.grade.into(),
                g.letter_grade.as_str().into(),
                g.fcw.into(),
                g.exam_status.as_str().into(),
                g.absence_reason.as_deref().into(),
            ]
        })
        .collect()
}

#[cfg(test)]
#[path = "rows_test.rs"]
mod tests;
