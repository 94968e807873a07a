use super::*;
use cw_warehouse::tables::FACT_ENROLLMENT;

#[test]
fn test_generate_unique_check() {
    let sql = generate_unique_check("dim_student", "access_number");
    assert!(sql.contains(r#"GROUP BY "access_number""#));
    assert!(sql.contains("HAVING COUNT(*) > 1"));
    assert!(sql.contains("IS NOT NULL"));
}

#[test]
fn test_generate_relationship_check() {
    let sql = generate_relationship_check("fact_grade", "student_id", "dim_student", "student_id");
    assert!(sql.contains(r#"FROM "fact_grade" AS src"#));
    assert!(sql.contains(r#"SELECT 1 FROM "dim_student" AS ref_tbl"#));
}

#[test]
fn test_generate_accepted_values_check() {
    let sql = generate_accepted_values_check("fact_grade", "letter_grade", &["A", "B+"], false);
    assert!(sql.contains("NOT IN ('A', 'B+')"));
    assert!(sql.contains("IS NULL"));

    let sql = generate_accepted_values_check("fact_payment", "deadline_type", &["o'k"], true);
    assert!(sql.contains("NOT IN ('o''k')"));
    assert!(!sql.contains("IS NULL"));
}

#[test]
fn test_range_rejects_non_finite_bounds() {
    assert!(generate_range_check("fact_grade", "grade", 0.0, 100.0).is_ok());
    assert!(generate_range_check("fact_grade", "grade", f64::NAN, 100.0).is_err());
    assert!(AuditCheck::range("fact_grade", "grade", 0.0, f64::INFINITY).is_err());
}

#[test]
fn test_table_checks_follow_definition() {
    let checks = table_checks(&FACT_ENROLLMENT);
    let names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"unique_fact_enrollment_enrollment_id"));
    assert!(names.contains(&"not_null_fact_enrollment_student_id"));
    assert!(names.contains(&"relationship_fact_enrollment_semester_id"));
    // nullable status column has no not-null check
    assert!(!names.contains(&"not_null_fact_enrollment_status"));
}

#[test]
fn test_star_checks_names_are_unique() {
    let checks = star_checks().unwrap();
    let mut names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
    assert!(checks
        .iter()
        .any(|c| c.name == "pattern_dim_student_access_number" && c.severity == Severity::Warn));
}
