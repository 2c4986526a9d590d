use ahash::AHashSet;
use chrono::{DateTime, Utc};

use super::models::{DirectoryEntry, FileRecord};
use crate::error::Error;

/// Persistence of file records.
pub trait FileRecordStore {
    fn find_by_directory_and_name(
        &self,
        directory_path: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, Error>;

    /// Insert when `record.id == 0`, update in place otherwise. Returns the id.
    fn save_file_record(&self, record: &FileRecord) -> Result<i64, Error>;

    fn delete_file_record(&self, record: &FileRecord) -> Result<(), Error>;

    fn count_by_directory(&self, directory_path: &str) -> Result<i64, Error>;

    /// Which of `directories` still have at least one file record. One query
    /// per chunk of paths, never one per directory.
    fn non_empty_directories_among(
        &self,
        directories: &[String],
    ) -> Result<AHashSet<String>, Error>;
}

/// Persistence of directory aggregate entries.
pub trait DirectoryEntryStore {
    fn find_by_path(&self, directory_path: &str) -> Result<Option<DirectoryEntry>, Error>;

    fn find_by_paths(&self, directory_paths: &[String]) -> Result<Vec<DirectoryEntry>, Error>;

    /// Insert when `entry.id == 0`, update in place otherwise. Returns the id.
    fn save_directory_entry(&self, entry: &DirectoryEntry) -> Result<i64, Error>;

    /// Set `last_modified_at` for every entry in `ids`.
    fn touch_entries(&self, ids: &[i64], at: DateTime<Utc>) -> Result<usize, Error>;

    fn delete_all(&self, ids: &[i64]) -> Result<usize, Error>;
}
