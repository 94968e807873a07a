use crate::{Conformer, StudentType};
use chrono::NaiveDate;
use cw_core::{Config, ExamStatus, MilestoneKind};
use cw_db::TextResult;
use cw_extract::RawTable;

fn raw(table: &str, columns: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        "fixture",
        table,
        TextResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|v| (!v.is_empty()).then(|| v.to_string()))
                        .collect()
                })
                .collect(),
        },
    )
}

fn config() -> Config {
    serde_yaml::from_str("name: campus\nas_of: 2025-10-01").unwrap()
}

fn fixture() -> Vec<RawTable> {
    vec![
        raw(
            "programs",
            &["ProgramID", "ProgramName"],
            &[&["1", "Bachelor of Laws (LLB)"], &["2", "BSc Computer Science"]],
        ),
        raw(
            "students",
            &["StudentID", "RegNo", "FullName", "ProgramID"],
            &[
                &["1", "S23B12/001", "Jane Doe", "1"],
                &["2", "S23B12/002", "John Okello Mukasa", "2"],
            ],
        ),
        raw(
            "courses",
            &["CourseID", "CourseCode", "CourseName", "CreditUnits", "DepartmentID"],
            &[&["10", "LAW101", "Contract Law", "4", ""]],
        ),
        raw(
            "enrollments",
            &["EnrollmentID", "StudentID", "CourseID", "EnrollmentDate", "AcademicYear", "Semester"],
            &[
                &["1", "1", "10", "2025-01-20", "2025", "Jan (Easter Semester)"],
                &["2", "99", "11", "", "", "May"],
            ],
        ),
        raw(
            "attendance",
            &["StudentID", "CourseID", "Date", "Status"],
            &[
                &["1", "10", "2025-02-03", "PRESENT"],
                &["1", "10", "2025-02-04", "LATE"],
                &["2", "10", "not a date", "ABSENT"],
            ],
        ),
        raw("grades", &["StudentID"], &[]),
        raw(
            "grades_feed",
            &["student_id", "course_code", "coursework_score", "exam_score", "exam_status", "exam_date"],
            &[
                &["S23B12/001", "LAW101", "60", "70", "Completed", "2025-05-20"],
                &["S23B12/002", "LAW101", "30", "80", "", "2025-05-20"],
                &["S23B12/002", "LAW101", "70", "", "MEX", "2025-05-20"],
            ],
        ),
        raw(
            "student_fees",
            &[
                "PaymentID",
                "StudentID",
                "AmountPaid",
                "TuitionNational",
                "TuitionInternational",
                "FunctionalFees",
                "Semester",
                "Year",
                "PaymentDate",
            ],
            &[
                &["1", "1", "1000000", "1500000", "0", "200000", "September (Advent)", "2025", "2025-08-29"],
                &["2", "2", "500000", "0", "2000000", "0", "September (Advent)", "2025", "2025-11-20"],
                &["3", "1", "100", "0", "0", "0", "", "", ""],
            ],
        ),
    ]
}

#[test]
fn test_students_and_synthesis_are_deterministic() {
    let config = config();
    let tables = fixture();
    let first = Conformer::new(&config, &tables, config.as_of_date()).run();
    let second = Conformer::new(&config, &tables, config.as_of_date()).run();

    let students = &first.data.students;
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].student_id, "S23B12/001");
    assert_eq!(students[1].first_name, "John");
    assert_eq!(students[1].last_name, "Okello Mukasa");
    assert_eq!(
        students[0].email,
        format!("{}@ucu.ac.ug", students[0].access_number)
    );
    assert!(crate::is_valid_access_number(&students[0].access_number));
    assert_ne!(students[0].access_number, students[1].access_number);
    assert!(students[0].admission_date <= NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    assert_eq!(students[0].program_id, Some(1));
    assert_eq!(first.data.students, second.data.students);
}

#[test]
fn test_references_resolve_through_source_ids() {
    let config = config();
    let tables = fixture();
    let out = Conformer::new(&config, &tables, config.as_of_date()).run();
    let enrollments = &out.data.enrollments;

    assert_eq!(enrollments[0].student_id, "S23B12/001");
    assert_eq!(enrollments[0].course_code, "LAW101");
    assert_eq!(enrollments[0].semester_id, 1);
    assert_eq!(enrollments[0].status, "Active");

    // unknown ids fall back to the synthesised patterns
    assert_eq!(enrollments[1].student_id, "STU000099");
    assert_eq!(enrollments[1].course_code, "COURSE011");
    assert_eq!(enrollments[1].semester_id, 2);
    assert_eq!(
        enrollments[1].enrollment_date,
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    );
}

#[test]
fn test_attendance_hours_and_bad_dates() {
    let config = config();
    let tables = fixture();
    let out = Conformer::new(&config, &tables, config.as_of_date()).run();
    let hours: Vec<f64> = out.data.attendance.iter().map(|a| a.hours).collect();
    assert_eq!(hours, vec![2.0, 1.0, 0.0]);
    assert!(out.data.attendance[2].attendance_date.is_none());
    assert_eq!(out.report.coerced.get("attendance"), Some(&1));
}

#[test]
fn test_grades_follow_program_policy() {
    let config = config();
    let tables = fixture();
    let out = Conformer::new(&config, &tables, config.as_of_date()).run();
    let grades = &out.data.grades;
    assert_eq!(grades.len(), 3);

    // law student: 0.3 * 60 + 0.7 * 70
    assert_eq!(grades[0].grade, 67.0);
    assert_eq!(grades[0].letter_grade, "C");
    assert_eq!(grades[0].exam_status, ExamStatus::Completed);

    // coursework below 35 fails coursework regardless of the exam
    assert!(grades[1].fcw);
    assert_eq!(grades[1].exam_status, ExamStatus::Fcw);
    assert_eq!(grades[1].letter_grade, "FCW");
    assert_eq!(grades[1].grade, 50.0);

    assert_eq!(grades[2].exam_score, None);
    assert_eq!(grades[2].exam_status, ExamStatus::Mex);
    assert_eq!(grades[2].letter_grade, "MEX");
    assert_eq!(grades[2].grade, 42.0);
    assert_eq!(grades[0].grade_id, "GRD000001");

    assert!(out
        .report
        .warnings
        .iter()
        .any(|w| w.contains("exam status FEX")));
}

#[test]
fn test_payments_carry_deadline_compliance() {
    let config = config();
    let tables = fixture();
    let out = Conformer::new(&config, &tables, config.as_of_date()).run();
    let payments = &out.data.payments;
    assert_eq!(payments.len(), 3);

    let prompt = &payments[0];
    assert_eq!(prompt.payment_id, "PAY000001");
    assert_eq!(prompt.student_id, "S23B12/001");
    assert_eq!(prompt.semester_id, 3);
    assert_eq!(
        prompt.semester_start_date,
        NaiveDate::from_ymd_opt(2025, 8, 29)
    );
    assert_eq!(prompt.student_type, StudentType::National);
    assert_eq!(prompt.outstanding, 700_000.0);
    let eval = prompt.deadline.as_ref().unwrap();
    assert!(eval.met);
    assert_eq!(eval.milestone_type, MilestoneKind::PromptPayment);
    assert_eq!(eval.penalty_amount, 0.0);

    let late = &payments[1];
    assert_eq!(late.student_type, StudentType::International);
    assert_eq!(late.outstanding, 1_500_000.0);
    let eval = late.deadline.as_ref().unwrap();
    assert!(!eval.met);
    assert_eq!(eval.milestone_type, MilestoneKind::LatePenaltyWeek1);
    assert_eq!(eval.weeks_from_deadline, 0.86);
    assert_eq!(eval.penalty_amount, 75_000.0);

    let undated = &payments[2];
    assert!(undated.deadline.is_none());
    assert_eq!(undated.year, 2025);
    assert_eq!(undated.status, "Completed");
    assert_eq!(undated.payment_method, "Bank Transfer");
    assert!(out
        .report
        .warnings
        .iter()
        .any(|w| w.starts_with("payments:")));
}

#[test]
fn test_missing_tables_conform_to_nothing() {
    let config = config();
    let out = Conformer::new(&config, &[], config.as_of_date()).run();
    assert!(out.data.students.is_empty());
    assert!(out.data.payments.is_empty());
    assert_eq!(out.report.rows.get("grades"), Some(&0));
}

#[test]
fn test_out_of_range_values_take_defaults() {
    let config = config();
    let mut tables = fixture();
    for table in tables.iter_mut() {
        if table.table == "grades_feed" {
            *table = raw(
                "grades_feed",
                &["student_id", "course_code", "coursework_score", "exam_score", "exam_status", "exam_date"],
                &[&["S23B12/001", "LAW101", "1000", "70", "Completed", "2025-05-20"]],
            );
        }
    }
    let out = Conformer::new(&config, &tables, config.as_of_date()).run();
    let grade = &out.data.grades[0];
    assert_eq!(grade.coursework_score, 0.0);
    assert!(grade.fcw);
    assert_eq!(grade.letter_grade, "FCW");
    assert_eq!(out.report.coerced.get("grades"), Some(&1));
}

#[test]
fn test_as_of_comes_from_the_caller() {
    let config = config();
    let tables = fixture();
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let out = Conformer::new(&config, &tables, as_of).run();
    // the undated enrollment falls back to the run's as-of date
    assert_eq!(out.data.enrollments[1].enrollment_date, as_of);
}
