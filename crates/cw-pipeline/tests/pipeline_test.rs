//! End-to-end runs against a fixture source database

use chrono::NaiveDate;
use cw_core::{Config, RunReport, RunStatus, Stage};
use cw_db::{Database, DuckDbBackend, TextResult};
use cw_pipeline::{Pipeline, PipelineError, PipelineOptions};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

const SOURCE_SQL: &str = r#"
CREATE TABLE faculties (FacultyID INTEGER, FacultyName VARCHAR, DeanName VARCHAR);
INSERT INTO faculties VALUES (1, 'Law', 'Dean A'), (2, 'Science', 'Dean B');

CREATE TABLE departments (DepartmentID INTEGER, DepartmentName VARCHAR, FacultyID INTEGER, HeadOfDepartment VARCHAR);
INSERT INTO departments VALUES
    (1, 'Law', 1, 'Head A'),
    (2, 'Computing', 2, 'Head B'),
    (3, 'Detached', 9, 'Head C');

CREATE TABLE programs (ProgramID INTEGER, ProgramName VARCHAR, DegreeLevel VARCHAR, DepartmentID INTEGER, DurationYears INTEGER);
INSERT INTO programs VALUES
    (1, 'Bachelor of Laws (LLB)', 'Bachelor', 1, 4),
    (2, 'BSc Computer Science', 'Bachelor', 2, 3);

CREATE TABLE students (StudentID INTEGER, RegNo VARCHAR, FullName VARCHAR, Gender VARCHAR, ProgramID INTEGER, AdmissionDate DATE);
INSERT INTO students VALUES
    (1, 'S23B12/001', 'Jane Doe', 'F', 1, '2023-08-20'),
    (2, 'S23B12/002', 'John Okello', 'M', 2, '2023-08-20');

CREATE TABLE courses (CourseID INTEGER, CourseCode VARCHAR, CourseName VARCHAR, CreditUnits INTEGER, DepartmentID INTEGER);
INSERT INTO courses VALUES (10, 'LAW101', 'Contract Law', 4, 1), (20, 'CSC101', 'Programming', 3, 2);

CREATE TABLE enrollments (EnrollmentID INTEGER, StudentID INTEGER, CourseID INTEGER, EnrollmentDate DATE, AcademicYear VARCHAR, Semester VARCHAR);
INSERT INTO enrollments VALUES
    (1, 1, 10, '2025-01-20', '2025', 'Jan (Easter Semester)'),
    (1, 1, 10, '2025-01-20', '2025', 'Jan (Easter Semester)'),
    (2, 2, 20, '2025-05-20', '2025', 'May (Trinity Semester)'),
    (3, 99, 10, '2025-05-20', '2025', 'May');

CREATE TABLE attendance (StudentID INTEGER, CourseID INTEGER, "Date" DATE, Status VARCHAR);
INSERT INTO attendance VALUES
    (1, 10, '2025-02-03', 'PRESENT'),
    (1, 10, '2025-02-03', 'LATE'),
    (2, 20, '2025-06-02', 'ABSENT'),
    (2, 20, NULL, 'PRESENT');

CREATE TABLE grades (GradeID INTEGER, StudentID INTEGER, CourseID INTEGER, CourseworkScore DECIMAL(5,2), ExamScore DECIMAL(5,2), ExamStatus VARCHAR, ExamDate DATE);
INSERT INTO grades VALUES
    (1, 1, 10, 60, 70, 'Completed', '2025-05-20'),
    (2, 2, 20, 30, 80, NULL, '2025-05-20'),
    (3, 2, 20, 70, NULL, 'MEX', '2025-05-20');

CREATE TABLE student_fees (PaymentID INTEGER, StudentID INTEGER, AmountPaid DECIMAL(15,2), TuitionNational DECIMAL(15,2), TuitionInternational DECIMAL(15,2), FunctionalFees DECIMAL(15,2), Semester VARCHAR, Year INTEGER, PaymentDate DATE);
INSERT INTO student_fees VALUES
    (1, 1, 1000000, 1500000, 0, 200000, 'September (Advent)', 2025, '2025-08-29'),
    (2, 2, 500000, 0, 2000000, 0, 'September (Advent)', 2025, '2025-11-20');
"#;

const TABLES: &str =
    "[faculties, departments, programs, students, courses, enrollments, attendance, grades, student_fees]";

async fn write_source(path: &Path, extra: &str) {
    let db = DuckDbBackend::from_path(path).unwrap();
    db.execute_batch(&format!("{}\n{}", SOURCE_SQL, extra))
        .await
        .unwrap();
}

fn config(root: &Path, source: &Path) -> Config {
    let yaml = format!(
        r#"
name: campus
as_of: 2025-10-01
target_path: {root}/target
warehouse:
  path: {root}/target/warehouse.duckdb
archive:
  path: {root}/target/bronze
calendar:
  start: 2025-01-01
  end: 2025-12-31
sources:
  - name: sis
    type: duckdb
    path: {source}
    tables: {tables}
"#,
        root = root.display(),
        source = source.display(),
        tables = TABLES,
    );
    let config: Config = serde_yaml::from_str(&yaml).unwrap();
    config.validate().unwrap();
    config
}

async fn setup() -> (TempDir, Config) {
    setup_with("").await
}

/// Fixture source plus extra statements run after it
async fn setup_with(extra: &str) -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("sis.duckdb");
    write_source(&source, extra).await;
    let config = config(dir.path(), &source);
    (dir, config)
}

fn warehouse(config: &Config) -> DuckDbBackend {
    DuckDbBackend::new(&config.warehouse.path).unwrap()
}

async fn counts(db: &DuckDbBackend) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    for table in cw_warehouse::LOAD_ORDER {
        let n = db
            .query_count(&format!("SELECT * FROM {}", table.name))
            .await
            .unwrap();
        out.push((table.name.to_string(), n));
    }
    out
}

/// Every star table, ordered by its primary key
async fn dump(db: &DuckDbBackend) -> Vec<(String, TextResult)> {
    let mut out = Vec::new();
    for table in cw_warehouse::LOAD_ORDER {
        let rows = db
            .query_text(&format!(
                "SELECT * FROM {} ORDER BY {}",
                table.name, table.primary_key
            ))
            .await
            .unwrap();
        out.push((table.name.to_string(), rows));
    }
    out
}

async fn single_row(db: &DuckDbBackend, sql: &str) -> Vec<Option<String>> {
    let mut result = db.query_text(sql).await.unwrap();
    assert_eq!(result.rows.len(), 1, "{}", sql);
    result.rows.remove(0)
}

#[tokio::test]
async fn test_run_loads_star_and_writes_report() {
    let (_dir, config) = setup().await;
    let report = Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stage, Stage::Done);
    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, vec![Stage::Extract, Stage::Transform, Stage::Load]);
    assert_eq!(report.total_rows(Stage::Extract), 24);
    assert!(report.details.contains_key("archive"));
    assert!(report.details.contains_key("load"));
    assert_eq!(report.details["audit"]["failed"], 0);

    let as_of = NaiveDate::from_ymd_opt(2025, 10, 1);
    assert_eq!(report.as_of, as_of);

    let saved = RunReport::load(&config.run_results_path()).unwrap().unwrap();
    assert_eq!(saved.run_id, report.run_id);
    assert_eq!(saved.status, RunStatus::Completed);
    assert_eq!(saved.as_of, as_of);

    let db = warehouse(&config);
    let counts = counts(&db).await;
    assert!(counts.contains(&("dim_student".to_string(), 2)));
    assert!(counts.contains(&("dim_semester".to_string(), 3)));
    assert!(counts.contains(&("dim_time".to_string(), 365)));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (_dir, config) = setup().await;
    Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    let first = dump(&warehouse(&config)).await;
    assert!(first.iter().all(|(_, rows)| !rows.rows.is_empty()));

    Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    let second = dump(&warehouse(&config)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_duplicates_and_orphans_are_dropped() {
    let (_dir, config) = setup().await;
    let report = Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();

    let enrollment = &report.details["load"]["tables"]["fact_enrollment"];
    assert_eq!(enrollment["input"], 4);
    assert_eq!(enrollment["duplicates"], 1);
    assert_eq!(enrollment["orphans"], 1);
    assert_eq!(enrollment["loaded"], 2);

    let department = &report.details["load"]["tables"]["dim_department"];
    assert_eq!(department["orphans"], 1);

    let db = warehouse(&config);
    let orphans = db
        .query_count(
            "SELECT * FROM fact_enrollment e \
             WHERE NOT EXISTS (SELECT 1 FROM dim_student s WHERE s.student_id = e.student_id)",
        )
        .await
        .unwrap();
    assert_eq!(orphans, 0);
    // undated attendance has no time key
    assert_eq!(
        db.query_count("SELECT * FROM fact_attendance").await.unwrap(),
        2
    );
    let row = single_row(
        &db,
        "SELECT total_hours, days_present FROM fact_attendance WHERE student_id = 'S23B12/001'",
    )
    .await;
    assert_eq!(row[0].as_deref(), Some("3.00"));
    // PRESENT and LATE on the same day count as one day
    assert_eq!(row[1].as_deref(), Some("1"));
}

#[tokio::test]
async fn test_grades_are_derived_per_program() {
    let (_dir, config) = setup().await;
    Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    let db = warehouse(&config);

    let law = single_row(
        &db,
        "SELECT grade, letter_grade, exam_status FROM fact_grade WHERE grade_id = 'GRD000001'",
    )
    .await;
    assert_eq!(law[0].as_deref(), Some("67.00"));
    assert_eq!(law[1].as_deref(), Some("C"));
    assert_eq!(law[2].as_deref(), Some("Completed"));

    let fcw = single_row(
        &db,
        "SELECT letter_grade, fcw FROM fact_grade WHERE grade_id = 'GRD000002'",
    )
    .await;
    assert_eq!(fcw[0].as_deref(), Some("FCW"));
    assert_eq!(fcw[1].as_deref(), Some("true"));

    let mex = single_row(
        &db,
        "SELECT exam_score, letter_grade FROM fact_grade WHERE grade_id = 'GRD000003'",
    )
    .await;
    assert_eq!(mex[0], None);
    assert_eq!(mex[1].as_deref(), Some("MEX"));
}

#[tokio::test]
async fn test_payments_carry_deadline_compliance() {
    let (_dir, config) = setup().await;
    Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    let db = warehouse(&config);

    let prompt = single_row(
        &db,
        "SELECT deadline_met, deadline_type, late_penalty FROM fact_payment WHERE payment_id = 'PAY000001'",
    )
    .await;
    assert_eq!(prompt[0].as_deref(), Some("true"));
    assert_eq!(prompt[1].as_deref(), Some("prompt_payment"));
    assert_eq!(prompt[2].as_deref(), Some("0.00"));

    let late = single_row(
        &db,
        "SELECT deadline_met, deadline_type, late_penalty, student_type FROM fact_payment WHERE payment_id = 'PAY000002'",
    )
    .await;
    assert_eq!(late[0].as_deref(), Some("false"));
    assert_eq!(late[1].as_deref(), Some("late_penalty_week1"));
    assert_eq!(late[2].as_deref(), Some("75000.00"));
    assert_eq!(late[3].as_deref(), Some("international"));
}

#[tokio::test]
async fn test_replay_rebuilds_the_same_warehouse() {
    let (dir, config) = setup().await;
    let first = Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    let loaded = dump(&warehouse(&config)).await;

    // the sources are gone; the snapshot is enough
    std::fs::remove_file(dir.path().join("sis.duckdb")).unwrap();
    let options = PipelineOptions {
        replay: Some(first.stamp.clone()),
        skip_audit: true,
    };
    let replayed = Pipeline::new(&config, options).run().await.unwrap();
    assert_eq!(replayed.stamp, first.stamp);
    assert!(!replayed.details.contains_key("audit"));
    assert_eq!(dump(&warehouse(&config)).await, loaded);
}

#[tokio::test]
async fn test_out_of_range_values_load_as_defaults() {
    let (_dir, config) = setup_with(
        r#"
ALTER TABLE grades ALTER CourseworkScore TYPE DOUBLE;
INSERT INTO grades VALUES (4, 1, 10, 1000, 70, 'Completed', '2025-05-20');
ALTER TABLE student_fees ALTER Year TYPE BIGINT;
ALTER TABLE student_fees ALTER AmountPaid TYPE DOUBLE;
INSERT INTO student_fees VALUES
    (3, 1, 1e16, 1500000, 0, 0, 'September (Advent)', 3000000000, '2025-09-01');
"#,
    )
    .await;
    let report = Pipeline::new(&config, PipelineOptions::default())
        .run()
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    let coerced = &report.details["conform"]["coerced"];
    assert_eq!(coerced["grades"], 1);
    assert_eq!(coerced["payments"], 2);

    let db = warehouse(&config);
    let grade = single_row(
        &db,
        "SELECT coursework_score, letter_grade FROM fact_grade WHERE grade_id = 'GRD000004'",
    )
    .await;
    assert_eq!(grade[0].as_deref(), Some("0.00"));
    assert_eq!(grade[1].as_deref(), Some("FCW"));

    // the year falls back to the payment date
    let payment = single_row(
        &db,
        "SELECT year, amount FROM fact_payment WHERE payment_id = 'PAY000003'",
    )
    .await;
    assert_eq!(payment[0].as_deref(), Some("2025"));
    assert_eq!(payment[1].as_deref(), Some("0.00"));
}

#[tokio::test]
async fn test_failure_is_recorded_in_report() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), &dir.path().join("missing.duckdb"));
    let stages = Mutex::new(Vec::new());

    let err = Pipeline::new(&config, PipelineOptions::default())
        .on_stage(|stage| stages.lock().unwrap().push(stage))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Extract(_)));
    assert_eq!(
        *stages.lock().unwrap(),
        vec![Stage::Extract, Stage::Failed]
    );

    let saved = RunReport::load(&config.run_results_path()).unwrap().unwrap();
    assert_eq!(saved.status, RunStatus::Failed);
    assert_eq!(saved.stage, Stage::Failed);
    assert!(saved.error.unwrap().starts_with("extract stage"));
    assert!(saved.finished_at.is_some());
}

#[tokio::test]
async fn test_replay_of_unknown_snapshot_fails() {
    let (_dir, config) = setup().await;
    let options = PipelineOptions {
        replay: Some("19990101T000000000".to_string()),
        skip_audit: false,
    };
    let err = Pipeline::new(&config, options).run().await.unwrap_err();
    assert!(err.to_string().contains("X004"));
}
