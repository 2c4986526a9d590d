use chrono::{TimeZone, Utc};
use material_sync_core::storage::models::*;
use material_sync_core::storage::{Database, DirectoryEntryStore, FileRecordStore};
use material_sync_core::MaterialCategory;

fn make_directory(db: &Database, path: &str) -> i64 {
    db.save_directory_entry(&DirectoryEntry {
        id: 0,
        directory_path: path.to_string(),
        partition_token: "1".to_string(),
        last_modified_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    })
    .unwrap()
}

fn make_record(directory_id: i64, dir: &str, name: &str) -> FileRecord {
    FileRecord {
        id: 0,
        directory_path: dir.to_string(),
        file_name: name.to_string(),
        material_category: MaterialCategory::SupportingFiles,
        last_event: EventKind::Added,
        last_event_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        partition_token: "1".to_string(),
        directory_id,
    }
}

#[test]
fn test_save_and_find_file_record() {
    let db = Database::open_in_memory().unwrap();
    let dir_id = make_directory(&db, "docs/");
    let id = db.save_file_record(&make_record(dir_id, "docs/", "a.md")).unwrap();
    assert!(id > 0);

    let found = db.find_by_directory_and_name("docs/", "a.md").unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.directory_id, dir_id);
    assert_eq!(found.last_event, EventKind::Added);
    assert!(db.find_by_directory_and_name("docs/", "b.md").unwrap().is_none());
}

#[test]
fn test_update_in_place_keeps_single_record() {
    let db = Database::open_in_memory().unwrap();
    let dir_id = make_directory(&db, "docs/");
    let id = db.save_file_record(&make_record(dir_id, "docs/", "a.md")).unwrap();

    let mut record = db.find_by_directory_and_name("docs/", "a.md").unwrap().unwrap();
    record.last_event = EventKind::Updated;
    record.last_event_at = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    assert_eq!(db.save_file_record(&record).unwrap(), id);

    assert_eq!(db.count_by_directory("docs/").unwrap(), 1);
    let reloaded = db.find_by_directory_and_name("docs/", "a.md").unwrap().unwrap();
    assert_eq!(reloaded.last_event, EventKind::Updated);
    assert_eq!(reloaded.last_event_at, Utc.timestamp_opt(1_700_000_100, 0).unwrap());
}

#[test]
fn test_duplicate_path_insert_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let dir_id = make_directory(&db, "docs/");
    db.save_file_record(&make_record(dir_id, "docs/", "a.md")).unwrap();
    assert!(db.save_file_record(&make_record(dir_id, "docs/", "a.md")).is_err());
}

#[test]
fn test_timestamp_round_trip_truncates_to_seconds() {
    let db = Database::open_in_memory().unwrap();
    let dir_id = make_directory(&db, "docs/");
    let mut record = make_record(dir_id, "docs/", "a.md");
    record.last_event_at = Utc.timestamp_opt(1_700_000_000, 999_999_999).unwrap();
    db.save_file_record(&record).unwrap();

    let first = db.find_by_directory_and_name("docs/", "a.md").unwrap().unwrap();
    assert_eq!(first.last_event_at, Utc.timestamp_opt(1_700_000_000, 0).unwrap());

    db.save_file_record(&first).unwrap();
    let second = db.find_by_directory_and_name("docs/", "a.md").unwrap().unwrap();
    assert_eq!(second.last_event_at, first.last_event_at);

    let raw: String = db
        .connection()
        .query_row(
            "SELECT last_event_at FROM file_record WHERE id = ?1",
            rusqlite::params![first.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(raw, "2023-11-14T22:13:20Z");
}

#[test]
fn test_non_empty_directories_among() {
    let db = Database::open_in_memory().unwrap();
    let a = make_directory(&db, "a/");
    let b = make_directory(&db, "b/");
    make_directory(&db, "c/");
    db.save_file_record(&make_record(a, "a/", "1.txt")).unwrap();
    db.save_file_record(&make_record(a, "a/", "2.txt")).unwrap();
    db.save_file_record(&make_record(b, "b/", "1.txt")).unwrap();

    let dirs = vec!["a/".to_string(), "c/".to_string(), "missing/".to_string()];
    let non_empty = db.non_empty_directories_among(&dirs).unwrap();
    assert_eq!(non_empty.len(), 1);
    assert!(non_empty.contains("a/"));
}

#[test]
fn test_non_empty_directories_among_many_paths() {
    let db = Database::open_in_memory().unwrap();
    let dir_id = make_directory(&db, "dir1199/");
    db.save_file_record(&make_record(dir_id, "dir1199/", "f.txt")).unwrap();

    let dirs: Vec<String> = (0..1200).map(|i| format!("dir{}/", i)).collect();
    let non_empty = db.non_empty_directories_among(&dirs).unwrap();
    assert_eq!(non_empty.len(), 1);
    assert!(non_empty.contains("dir1199/"));
}

#[test]
fn test_directory_find_touch_and_delete() {
    let db = Database::open_in_memory().unwrap();
    let a = make_directory(&db, "a/");
    let b = make_directory(&db, "b/");

    let found = db
        .find_by_paths(&["a/".to_string(), "b/".to_string(), "z/".to_string()])
        .unwrap();
    assert_eq!(found.len(), 2);

    let later = Utc.timestamp_opt(1_700_000_500, 250_000_000).unwrap();
    assert_eq!(db.touch_entries(&[a], later).unwrap(), 1);
    let touched = db.find_by_path("a/").unwrap().unwrap();
    assert_eq!(touched.last_modified_at, Utc.timestamp_opt(1_700_000_500, 0).unwrap());
    let untouched = db.find_by_path("b/").unwrap().unwrap();
    assert_eq!(untouched.last_modified_at, Utc.timestamp_opt(1_700_000_000, 0).unwrap());

    assert_eq!(db.delete_all(&[a, b]).unwrap(), 2);
    assert!(db.list_directory_entries().unwrap().is_empty());
}

#[test]
fn test_referenced_directory_cannot_be_deleted() {
    let db = Database::open_in_memory().unwrap();
    let a = make_directory(&db, "a/");
    db.save_file_record(&make_record(a, "a/", "1.txt")).unwrap();
    assert!(db.delete_all(&[a]).is_err());
}

#[test]
fn test_commit_log_round_trip() {
    let db = Database::open_in_memory().unwrap();
    let entry = CommitLogEntry {
        id: 0,
        repository_name: "course".to_string(),
        repository_url: "https://example.com/course".to_string(),
        git_ref: "refs/heads/main".to_string(),
        commit_id: "abc123".to_string(),
        message: "add lesson".to_string(),
        partition_token: Some("7".to_string()),
        added: vec!["lesson1/plan.md".to_string()],
        modified: vec![],
        removed: vec!["old.txt".to_string()],
        received_at: Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap(),
    };
    let id = db.insert_commit_log(&entry).unwrap();

    let log = db.list_commit_log(10).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, id);
    assert_eq!(log[0].added, entry.added);
    assert_eq!(log[0].removed, entry.removed);
    assert_eq!(log[0].partition_token.as_deref(), Some("7"));
    assert_eq!(log[0].received_at, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
}

#[test]
fn test_truncate_all() {
    let db = Database::open_in_memory().unwrap();
    let a = make_directory(&db, "a/");
    db.save_file_record(&make_record(a, "a/", "1.txt")).unwrap();
    db.truncate_all().unwrap();
    assert!(db.list_file_records().unwrap().is_empty());
    assert!(db.list_directory_entries().unwrap().is_empty());
}

#[test]
fn test_reopen_on_disk_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("materials.db");
    let path = path.to_str().unwrap();
    {
        let db = Database::open(path).unwrap();
        make_directory(&db, "a/");
    }
    let db = Database::open(path).unwrap();
    assert_eq!(db.list_directory_entries().unwrap().len(), 1);
}
