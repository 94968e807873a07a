//! The Gold star schema

use crate::schema::{Column, ForeignKey, TableDef};

pub static DIM_FACULTY: TableDef = TableDef {
    name: "dim_faculty",
    columns: &[
        Column::required("faculty_id", "BIGINT"),
        Column::nullable("faculty_name", "VARCHAR"),
        Column::nullable("dean_name", "VARCHAR"),
    ],
    primary_key: "faculty_id",
    unique: &[],
    foreign_keys: &[],
    indexes: &[],
};

pub static DIM_DEPARTMENT: TableDef = TableDef {
    name: "dim_department",
    columns: &[
        Column::required("department_id", "BIGINT"),
        Column::nullable("department_name", "VARCHAR"),
        Column::nullable("faculty_id", "BIGINT"),
        Column::nullable("head_of_department", "VARCHAR"),
    ],
    primary_key: "department_id",
    unique: &[],
    foreign_keys: &[ForeignKey::new("faculty_id", "dim_faculty", "faculty_id")],
    indexes: &[&["faculty_id"]],
};

pub static DIM_PROGRAM: TableDef = TableDef {
    name: "dim_program",
    columns: &[
        Column::required("program_id", "BIGINT"),
        Column::nullable("program_name", "VARCHAR"),
        Column::nullable("degree_level", "VARCHAR"),
        Column::nullable("department_id", "BIGINT"),
        Column::nullable("duration_years", "INTEGER"),
    ],
    primary_key: "program_id",
    unique: &[],
    foreign_keys: &[ForeignKey::new("department_id", "dim_department", "department_id")],
    indexes: &[&["department_id"]],
};

/// `program_id` is indexed but not a foreign key; students may
/// reference programs absent from the programs extract.
pub static DIM_STUDENT: TableDef = TableDef {
    name: "dim_student",
    columns: &[
        Column::required("student_id", "VARCHAR"),
        Column::nullable("reg_no", "VARCHAR"),
        Column::nullable("access_number", "VARCHAR"),
        Column::nullable("first_name", "VARCHAR"),
        Column::nullable("last_name", "VARCHAR"),
        Column::nullable("email", "VARCHAR"),
        Column::nullable("gender", "VARCHAR"),
        Column::nullable("nationality", "VARCHAR"),
        Column::nullable("admission_date", "DATE"),
        Column::nullable("high_school", "VARCHAR"),
        Column::nullable("high_school_district", "VARCHAR"),
        Column::nullable("program_id", "BIGINT"),
        Column::nullable("year_of_study", "INTEGER"),
        Column::nullable("status", "VARCHAR"),
    ],
    primary_key: "student_id",
    unique: &["access_number"],
    foreign_keys: &[],
    indexes: &[
        &["last_name", "first_name"],
        &["email"],
        &["reg_no"],
        &["high_school"],
        &["program_id"],
        &["status"],
    ],
};

pub static DIM_COURSE: TableDef = TableDef {
    name: "dim_course",
    columns: &[
        Column::required("course_code", "VARCHAR"),
        Column::nullable("course_name", "VARCHAR"),
        Column::nullable("credits", "INTEGER"),
        Column::nullable("department", "VARCHAR"),
    ],
    primary_key: "course_code",
    unique: &[],
    foreign_keys: &[],
    indexes: &[&["department"]],
};

pub static DIM_SEMESTER: TableDef = TableDef {
    name: "dim_semester",
    columns: &[
        Column::required("semester_id", "INTEGER"),
        Column::required("semester_name", "VARCHAR"),
        Column::required("academic_year", "VARCHAR"),
    ],
    primary_key: "semester_id",
    unique: &[],
    foreign_keys: &[],
    indexes: &[&["academic_year"]],
};

pub static DIM_TIME: TableDef = TableDef {
    name: "dim_time",
    columns: &[
        Column::required("date_key", "VARCHAR"),
        Column::required("date", "DATE"),
        Column::required("year", "INTEGER"),
        Column::required("quarter", "INTEGER"),
        Column::required("month", "INTEGER"),
        Column::required("month_name", "VARCHAR"),
        Column::required("day", "INTEGER"),
        Column::required("day_of_week", "INTEGER"),
        Column::required("day_name", "VARCHAR"),
        Column::required("is_weekend", "BOOLEAN"),
    ],
    primary_key: "date_key",
    unique: &[],
    foreign_keys: &[],
    indexes: &[&["date"], &["year", "month"]],
};

pub static FACT_ENROLLMENT: TableDef = TableDef {
    name: "fact_enrollment",
    columns: &[
        Column::required("enrollment_id", "VARCHAR"),
        Column::required("student_id", "VARCHAR"),
        Column::required("course_code", "VARCHAR"),
        Column::required("date_key", "VARCHAR"),
        Column::required("semester_id", "INTEGER"),
        Column::nullable("status", "VARCHAR"),
    ],
    primary_key: "enrollment_id",
    unique: &[],
    foreign_keys: &[
        ForeignKey::new("student_id", "dim_student", "student_id"),
        ForeignKey::new("course_code", "dim_course", "course_code"),
        ForeignKey::new("date_key", "dim_time", "date_key"),
        ForeignKey::new("semester_id", "dim_semester", "semester_id"),
    ],
    indexes: &[&["student_id"], &["course_code"], &["date_key"], &["semester_id"]],
};

pub static FACT_ATTENDANCE: TableDef = TableDef {
    name: "fact_attendance",
    columns: &[
        Column::required("attendance_id", "BIGINT"),
        Column::required("student_id", "VARCHAR"),
        Column::required("course_code", "VARCHAR"),
        Column::required("date_key", "VARCHAR"),
        Column::required("total_hours", "DECIMAL(10,2)"),
        Column::required("days_present", "INTEGER"),
    ],
    primary_key: "attendance_id",
    unique: &[],
    foreign_keys: &[
        ForeignKey::new("student_id", "dim_student", "student_id"),
        ForeignKey::new("course_code", "dim_course", "course_code"),
        ForeignKey::new("date_key", "dim_time", "date_key"),
    ],
    indexes: &[&["student_id"], &["course_code"], &["date_key"]],
};

pub static FACT_PAYMENT: TableDef = TableDef {
    name: "fact_payment",
    columns: &[
        Column::required("payment_id", "VARCHAR"),
        Column::required("student_id", "VARCHAR"),
        Column::required("date_key", "VARCHAR"),
        Column::required("semester_id", "INTEGER"),
        Column::required("year", "INTEGER"),
        Column::required("tuition_national", "DECIMAL(15,2)"),
        Column::required("tuition_international", "DECIMAL(15,2)"),
        Column::required("functional_fees", "DECIMAL(15,2)"),
        Column::required("amount", "DECIMAL(15,2)"),
        Column::nullable("payment_method", "VARCHAR"),
        Column::nullable("status", "VARCHAR"),
        Column::required("student_type", "VARCHAR"),
        Column::nullable("payment_timestamp", "TIMESTAMP"),
        Column::nullable("semester_start_date", "DATE"),
        Column::required("deadline_met", "BOOLEAN"),
        Column::nullable("deadline_type", "VARCHAR"),
        Column::nullable("weeks_from_deadline", "DECIMAL(7,2)"),
        Column::required("late_penalty", "DECIMAL(15,2)"),
    ],
    primary_key: "payment_id",
    unique: &[],
    foreign_keys: &[
        ForeignKey::new("student_id", "dim_student", "student_id"),
        ForeignKey::new("date_key", "dim_time", "date_key"),
        ForeignKey::new("semester_id", "dim_semester", "semester_id"),
    ],
    indexes: &[
        &["student_id"],
        &["date_key"],
        &["semester_id"],
        &["year"],
        &["status"],
        &["payment_timestamp"],
        &["deadline_met"],
        &["deadline_type"],
    ],
};

pub static FACT_GRADE: TableDef = TableDef {
    name: "fact_grade",
    columns: &[
        Column::required("grade_id", "VARCHAR"),
        Column::required("student_id", "VARCHAR"),
        Column::required("course_code", "VARCHAR"),
        Column::required("date_key", "VARCHAR"),
        Column::required("semester_id", "INTEGER"),
        Column::required("coursework_score", "DECIMAL(5,2)"),
        Column::nullable("exam_score", "DECIMAL(5,2)"),
        Column::required("grade", "DECIMAL(5,2)"),
        Column::required("letter_grade", "VARCHAR"),
        Column::required("fcw", "BOOLEAN"),
        Column::required("exam_status", "VARCHAR"),
        Column::nullable("absence_reason", "VARCHAR"),
    ],
    primary_key: "grade_id",
    unique: &[],
    foreign_keys: &[
        ForeignKey::new("student_id", "dim_student", "student_id"),
        ForeignKey::new("course_code", "dim_course", "course_code"),
        ForeignKey::new("date_key", "dim_time", "date_key"),
        ForeignKey::new("semester_id", "dim_semester", "semester_id"),
    ],
    indexes: &[
        &["student_id"],
        &["course_code"],
        &["date_key"],
        &["semester_id"],
        &["grade"],
    ],
};

/// Every star table in load order; referenced tables precede referencing ones.
pub static LOAD_ORDER: [&TableDef; 11] = [
    &DIM_FACULTY,
    &DIM_DEPARTMENT,
    &DIM_PROGRAM,
    &DIM_STUDENT,
    &DIM_COURSE,
    &DIM_SEMESTER,
    &DIM_TIME,
    &FACT_ENROLLMENT,
    &FACT_ATTENDANCE,
    &FACT_PAYMENT,
    &FACT_GRADE,
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    LOAD_ORDER.iter().copied().find(|t| t.name == name)
}
