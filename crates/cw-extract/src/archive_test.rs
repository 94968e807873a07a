use super::*;
use tempfile::TempDir;

fn students() -> RawTable {
    RawTable::new(
        "academics",
        "students",
        TextResult {
            columns: vec!["StudentID".into(), "RegNo".into(), "FullName".into()],
            rows: vec![
                vec![Some("1".into()), Some("REG001".into()), Some("Jane Doe".into())],
                vec![Some("2".into()), Some("REG002".into()), None],
            ],
        },
    )
}

fn courses() -> RawTable {
    RawTable::new(
        "academics",
        "courses",
        TextResult {
            columns: vec!["CourseID".into(), "CourseCode".into()],
            rows: Vec::new(),
        },
    )
}

#[test]
fn test_stamp_shape() {
    let stamp = new_stamp();
    assert_eq!(stamp.len(), 18);
    assert_eq!(&stamp[8..9], "T");
}

#[tokio::test]
async fn test_write_and_replay() {
    let dir = TempDir::new().unwrap();
    let writer = ArchiveWriter::new(dir.path()).unwrap();
    let stamp = "20250901T101500123";

    let summary = writer.write(&[courses(), students()], stamp).await.unwrap();
    assert_eq!(summary.written.len(), 2);
    assert!(summary.failed.is_empty());
    assert!(dir
        .path()
        .join("academics_students_20250901T101500123.parquet")
        .exists());
    assert!(dir.path().join("manifest_20250901T101500123.json").exists());

    let reader = ArchiveReader::new(dir.path()).unwrap();
    assert_eq!(reader.list_runs().unwrap(), vec![stamp.to_string()]);

    let replayed = reader.replay(stamp).await.unwrap();
    assert_eq!(replayed.len(), 2);
    assert_eq!(replayed[0].table, "courses");
    assert!(replayed[0].is_empty());
    assert_eq!(replayed[1], students());
}

#[tokio::test]
async fn test_existing_file_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let writer = ArchiveWriter::new(dir.path()).unwrap();
    let stamp = "20250901T101500123";
    let target = dir.path().join("academics_students_20250901T101500123.parquet");
    std::fs::write(&target, b"existing").unwrap();

    let summary = writer.write(&[students(), courses()], stamp).await.unwrap();

    // The collision fails only its own dataset
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].table, "students");
    assert_eq!(summary.written.len(), 1);
    assert_eq!(std::fs::read(&target).unwrap(), b"existing");
}

#[tokio::test]
async fn test_tables_without_columns_are_skipped() {
    let dir = TempDir::new().unwrap();
    let writer = ArchiveWriter::new(dir.path()).unwrap();
    let summary = writer
        .write(&[RawTable::empty("grades_feed", "grades_feed")], "s1")
        .await
        .unwrap();
    assert!(summary.written.is_empty());
    assert_eq!(summary.skipped, vec!["grades_feed.grades_feed".to_string()]);
}

#[tokio::test]
async fn test_replay_unknown_stamp() {
    let dir = TempDir::new().unwrap();
    let reader = ArchiveReader::new(dir.path()).unwrap();
    let err = reader.replay("nope").await.unwrap_err();
    assert!(matches!(err, ExtractError::SnapshotNotFound { .. }));
}

#[test]
fn test_list_runs_sorted() {
    let dir = TempDir::new().unwrap();
    for stamp in ["20250902T000000000", "20250901T000000000"] {
        std::fs::write(dir.path().join(format!("manifest_{}.json", stamp)), "{}").unwrap();
    }
    std::fs::write(dir.path().join("academics_students_x.parquet"), "").unwrap();

    let reader = ArchiveReader::new(dir.path()).unwrap();
    assert_eq!(
        reader.list_runs().unwrap(),
        vec!["20250901T000000000", "20250902T000000000"]
    );
}
