use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_query_count() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE nums AS SELECT * FROM range(10) t(n)")
        .await
        .unwrap();

    let count = db.query_count("SELECT * FROM nums").await.unwrap();
    assert_eq!(count, 10);
}

#[tokio::test]
async fn test_relation_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t1 (id INT)").await.unwrap();

    assert!(db.relation_exists("t1").await.unwrap());
    assert!(!db.relation_exists("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_query_text_renders_values() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE students (StudentID INTEGER, FullName VARCHAR, Fee DECIMAL(10,2), Born DATE);
         INSERT INTO students VALUES (1, 'Jane Doe', 1500.50, '2001-02-03'), (2, NULL, NULL, NULL);",
    )
    .await
    .unwrap();

    let result = db
        .query_text("SELECT * FROM students ORDER BY StudentID")
        .await
        .unwrap();
    assert_eq!(result.columns, vec!["StudentID", "FullName", "Fee", "Born"]);
    assert_eq!(
        result.rows[0],
        vec![
            Some("1".to_string()),
            Some("Jane Doe".to_string()),
            Some("1500.50".to_string()),
            Some("2001-02-03".to_string())
        ]
    );
    assert_eq!(result.rows[1][1], None);
}

#[tokio::test]
async fn test_query_text_empty_table() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE empty_t (a VARCHAR, b INT)")
        .await
        .unwrap();

    let result = db.query_text("SELECT * FROM empty_t").await.unwrap();
    assert_eq!(result.columns, vec!["a", "b"]);
    assert!(result.rows.is_empty());
}

#[tokio::test]
async fn test_query_keys_skips_nulls() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE k (id INTEGER); INSERT INTO k VALUES (1), (2), (2), (NULL);",
    )
    .await
    .unwrap();

    let keys = db.query_keys("SELECT id FROM k").await.unwrap();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("1"));
    assert!(keys.contains("2"));
}

#[tokio::test]
async fn test_insert_rows_casts_values() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE f (id VARCHAR, amount DECIMAL(15,2), paid DATE, ok BOOLEAN)")
        .await
        .unwrap();

    let rows = vec![
        vec![
            SqlValue::from("P1"),
            SqlValue::Float(100.5),
            SqlValue::from("2025-08-29"),
            SqlValue::Bool(true),
        ],
        vec![
            SqlValue::from("P2"),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Bool(false),
        ],
    ];
    let columns = [
        ("id", "VARCHAR"),
        ("amount", "DECIMAL(15,2)"),
        ("paid", "DATE"),
        ("ok", "BOOLEAN"),
    ];
    let inserted = db.insert_rows("f", &columns, &rows).await.unwrap();
    assert_eq!(inserted, 2);

    let sample = db
        .query_sample_rows("SELECT * FROM f ORDER BY id", 10)
        .await
        .unwrap();
    assert_eq!(sample[0], "P1, 100.50, 2025-08-29, true");
    assert_eq!(sample[1], "P2, NULL, NULL, false");
}

#[tokio::test]
async fn test_insert_rows_rolls_back_on_error() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE pk (id INTEGER PRIMARY KEY)")
        .await
        .unwrap();

    let rows = vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(1)]];
    let result = db.insert_rows("pk", &[("id", "INTEGER")], &rows).await;
    assert!(result.is_err());
    assert_eq!(db.query_count("SELECT * FROM pk").await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_rows_shape_mismatch() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE s (a INTEGER, b INTEGER)")
        .await
        .unwrap();

    let rows = vec![vec![SqlValue::Int(1)]];
    let err = db
        .insert_rows("s", &[("a", "INTEGER"), ("b", "INTEGER")], &rows)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::RowShape { .. }));
}

#[tokio::test]
async fn test_attach_read_only_and_parquet_copy() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("source.duckdb");
    {
        let conn = Connection::open(&source_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE courses (CourseID INTEGER, CourseCode VARCHAR);
             INSERT INTO courses VALUES (1, 'CSC101');",
        )
        .unwrap();
    }

    let db = DuckDbBackend::in_memory().unwrap();
    db.attach(&source_path, "academics", true).await.unwrap();
    assert!(db.relation_exists("academics.courses").await.unwrap());

    let parquet = dir.path().join("courses.parquet");
    db.copy_to_parquet("SELECT * FROM \"academics\".\"courses\"", &parquet)
        .await
        .unwrap();
    db.detach("academics").await.unwrap();

    let back = db
        .query_text(&format!("SELECT * FROM read_parquet('{}')", parquet.display()))
        .await
        .unwrap();
    assert_eq!(back.rows, vec![vec![Some("1".to_string()), Some("CSC101".to_string())]]);
}

#[tokio::test]
async fn test_attach_missing_file() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .attach(Path::new("/nonexistent/source.duckdb"), "x", true)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::AttachError { .. }));
}

#[test]
fn test_new_memory_path() {
    assert!(DuckDbBackend::new(":memory:").is_ok());
}
