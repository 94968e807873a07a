//! Conformed (Silver) record types

use chrono::{NaiveDate, NaiveDateTime};
use cw_core::{DeadlineEvaluation, ExamStatus, ProgramCategory};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    /// Natural key: the registration number, or `STU######`
    pub student_id: String,
    pub reg_no: String,
    pub access_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub nationality: String,
    pub admission_date: NaiveDate,
    pub high_school: String,
    pub high_school_district: String,
    pub program_id: Option<i64>,
    pub year_of_study: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    pub course_code: String,
    pub course_name: String,
    pub credits: i64,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultyRecord {
    pub faculty_id: Option<i64>,
    pub faculty_name: String,
    pub dean_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentRecord {
    pub department_id: Option<i64>,
    pub department_name: String,
    pub faculty_id: Option<i64>,
    pub head_of_department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramRecord {
    pub program_id: Option<i64>,
    pub program_name: String,
    pub degree_level: String,
    pub department_id: Option<i64>,
    pub duration_years: i64,
    pub category: ProgramCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRecord {
    pub enrollment_id: String,
    pub student_id: String,
    pub course_code: String,
    pub enrollment_date: NaiveDate,
    pub semester_id: i64,
    pub status: String,
}

/// One attendance mark; aggregated per student, course and day on load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub course_code: String,
    pub attendance_date: Option<NaiveDate>,
    pub hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentType {
    National,
    International,
}

impl StudentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentType::National => "national",
            StudentType::International => "international",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub student_id: String,
    pub payment_date: Option<NaiveDate>,
    pub payment_timestamp: Option<NaiveDateTime>,
    pub semester_id: i64,
    pub year: i64,
    pub tuition_national: f64,
    pub tuition_international: f64,
    pub functional_fees: f64,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub student_type: StudentType,
    pub semester_start_date: Option<NaiveDate>,
    pub outstanding: f64,
    /// Absent when the payment has no usable date
    pub deadline: Option<DeadlineEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    pub grade_id: String,
    pub student_id: String,
    pub course_code: String,
    pub exam_date: NaiveDate,
    pub semester_id: i64,
    pub coursework_score: f64,
    pub exam_score: Option<f64>,
    pub grade: f64,
    pub letter_grade: String,
    pub fcw: bool,
    pub exam_status: ExamStatus,
    pub absence_reason: Option<String>,
}

/// Every conformed entity of one run
#[derive(Debug, Clone, Default)]
pub struct SilverData {
    pub faculties: Vec<FacultyRecord>,
    pub departments: Vec<DepartmentRecord>,
    pub programs: Vec<ProgramRecord>,
    pub students: Vec<StudentRecord>,
    pub courses: Vec<CourseRecord>,
    pub enrollments: Vec<EnrollmentRecord>,
    pub attendance: Vec<AttendanceRecord>,
    pub payments: Vec<PaymentRecord>,
    pub grades: Vec<GradeRecord>,
}
