//! cw-conform - Silver conformer for the campus warehouse
//!
//! Maps raw source rows onto typed records: canonical keys, coerced fields,
//! synthesised attributes, derived grades and deadline-compliance fields.

mod activity;
mod catalog;
pub mod coerce;
pub mod conformer;
mod finance;
mod grade;
pub mod lookup;
mod org;
pub mod record;
pub mod report;
mod student;

pub use activity::attendance_hours;
pub use conformer::{ConformOutput, Conformer};
pub use finance::{outstanding_balance, synth_payment_id};
pub use grade::synth_grade_id;
pub use lookup::{synth_course_code, synth_student_id, KeyMaps};
pub use record::{
    AttendanceRecord, CourseRecord, DepartmentRecord, EnrollmentRecord, FacultyRecord,
    GradeRecord, PaymentRecord, ProgramRecord, SilverData, StudentRecord, StudentType,
};
pub use report::ConformReport;
pub use student::{is_valid_access_number, split_full_name};

#[cfg(test)]
#[path = "conformer_test.rs"]
mod conformer_test;
