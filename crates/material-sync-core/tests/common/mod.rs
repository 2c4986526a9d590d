#![allow(dead_code)]

use ahash::AHashSet;
use chrono::{DateTime, Duration, TimeZone, Utc};
use material_sync_core::processor::Clock;
use material_sync_core::storage::models::{DirectoryEntry, FileRecord};
use material_sync_core::storage::{Database, DirectoryEntryStore, FileRecordStore};
use material_sync_core::{ChangeSet, Error};
use std::cell::Cell;

/// Clock that advances 1.5 seconds on every reading, so stored values expose
/// truncation and successive events get distinct seconds.
pub struct StepClock {
    next: Cell<DateTime<Utc>>,
}

impl StepClock {
    pub fn starting_at(secs: i64) -> Self {
        Self {
            next: Cell::new(Utc.timestamp_opt(secs, 500_000_000).unwrap()),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.next.get();
        self.next.set(now + Duration::milliseconds(1500));
        now
    }
}

pub fn changes(added: &[&str], modified: &[&str], removed: &[&str]) -> ChangeSet {
    let owned = |paths: &[&str]| paths.iter().map(|p| p.to_string()).collect();
    ChangeSet {
        added: owned(added),
        modified: owned(modified),
        removed: owned(removed),
    }
}

/// Delegates to a real database but fails selected operations.
pub struct FaultyStore {
    pub db: Database,
    pub fail_save_for: Option<String>,
    pub fail_directory_insert: bool,
    pub fail_touch: bool,
    pub fail_prune_query: bool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            fail_save_for: None,
            fail_directory_insert: false,
            fail_touch: false,
            fail_prune_query: false,
        }
    }
}

fn injected(what: &str) -> Error {
    Error::Other(format!("injected failure: {}", what))
}

impl FileRecordStore for FaultyStore {
    fn find_by_directory_and_name(
        &self,
        directory_path: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, Error> {
        self.db.find_by_directory_and_name(directory_path, file_name)
    }

    fn save_file_record(&self, record: &FileRecord) -> Result<i64, Error> {
        if self.fail_save_for.as_deref() == Some(record.file_name.as_str()) {
            return Err(injected("save_file_record"));
        }
        self.db.save_file_record(record)
    }

    fn delete_file_record(&self, record: &FileRecord) -> Result<(), Error> {
        self.db.delete_file_record(record)
    }

    fn count_by_directory(&self, directory_path: &str) -> Result<i64, Error> {
        self.db.count_by_directory(directory_path)
    }

    fn non_empty_directories_among(
        &self,
        directories: &[String],
    ) -> Result<AHashSet<String>, Error> {
        if self.fail_prune_query {
            return Err(injected("non_empty_directories_among"));
        }
        self.db.non_empty_directories_among(directories)
    }
}

impl DirectoryEntryStore for FaultyStore {
    fn find_by_path(&self, directory_path: &str) -> Result<Option<DirectoryEntry>, Error> {
        self.db.find_by_path(directory_path)
    }

    fn find_by_paths(&self, directory_paths: &[String]) -> Result<Vec<DirectoryEntry>, Error> {
        self.db.find_by_paths(directory_paths)
    }

    fn save_directory_entry(&self, entry: &DirectoryEntry) -> Result<i64, Error> {
        if self.fail_directory_insert {
            return Err(injected("save_directory_entry"));
        }
        self.db.save_directory_entry(entry)
    }

    fn touch_entries(&self, ids: &[i64], at: DateTime<Utc>) -> Result<usize, Error> {
        if self.fail_touch {
            return Err(injected("touch_entries"));
        }
        self.db.touch_entries(ids, at)
    }

    fn delete_all(&self, ids: &[i64]) -> Result<usize, Error> {
        self.db.delete_all(ids)
    }
}
