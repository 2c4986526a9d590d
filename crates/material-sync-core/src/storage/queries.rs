use ahash::AHashSet;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::debug;

use super::models::*;
use super::sqlite::Database;
use super::store::{DirectoryEntryStore, FileRecordStore};
use crate::error::Error;

/// Paths per `IN (...)` list. Stays well below SQLite's bound-parameter limit.
pub const MAX_BATCH_PARAMETERS: usize = 500;

const FILE_RECORD_COLUMNS: &str = "id, directory_path, file_name, material_category, \
     last_event, last_event_at, partition_token, directory_id";

const DIRECTORY_ENTRY_COLUMNS: &str = "id, directory_path, partition_token, last_modified_at";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_list_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn file_record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        directory_path: row.get(1)?,
        file_name: row.get(2)?,
        material_category: row.get(3)?,
        last_event: row.get(4)?,
        last_event_at: timestamp_column(row, 5)?,
        partition_token: row.get(6)?,
        directory_id: row.get(7)?,
    })
}

fn directory_entry_from_row(row: &Row<'_>) -> rusqlite::Result<DirectoryEntry> {
    Ok(DirectoryEntry {
        id: row.get(0)?,
        directory_path: row.get(1)?,
        partition_token: row.get(2)?,
        last_modified_at: timestamp_column(row, 3)?,
    })
}

impl FileRecordStore for Database {
    fn find_by_directory_and_name(
        &self,
        directory_path: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, Error> {
        let record = self
            .connection()
            .query_row(
                &format!(
                    "SELECT {} FROM file_record WHERE directory_path = ?1 AND file_name = ?2",
                    FILE_RECORD_COLUMNS
                ),
                params![directory_path, file_name],
                file_record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn save_file_record(&self, record: &FileRecord) -> Result<i64, Error> {
        let at = format_timestamp(record.last_event_at);
        if record.id == 0 {
            self.connection().execute(
                "INSERT INTO file_record \
                 (directory_path, file_name, material_category, last_event, last_event_at, \
                  partition_token, directory_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.directory_path,
                    record.file_name,
                    record.material_category,
                    record.last_event,
                    at,
                    record.partition_token,
                    record.directory_id,
                ],
            )?;
            Ok(self.connection().last_insert_rowid())
        } else {
            let changed = self.connection().execute(
                "UPDATE file_record SET material_category = ?1, last_event = ?2, \
                 last_event_at = ?3, partition_token = ?4 WHERE id = ?5",
                params![
                    record.material_category,
                    record.last_event,
                    at,
                    record.partition_token,
                    record.id,
                ],
            )?;
            if changed == 0 {
                return Err(Error::Other(format!(
                    "file record {} vanished before update",
                    record.id
                )));
            }
            Ok(record.id)
        }
    }

    fn delete_file_record(&self, record: &FileRecord) -> Result<(), Error> {
        self.connection()
            .execute("DELETE FROM file_record WHERE id = ?1", params![record.id])?;
        Ok(())
    }

    fn count_by_directory(&self, directory_path: &str) -> Result<i64, Error> {
        let count = self.connection().query_row(
            "SELECT COUNT(*) FROM file_record WHERE directory_path = ?1",
            params![directory_path],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn non_empty_directories_among(
        &self,
        directories: &[String],
    ) -> Result<AHashSet<String>, Error> {
        let mut non_empty = AHashSet::new();
        for chunk in directories.chunks(MAX_BATCH_PARAMETERS) {
            let mut stmt = self.connection().prepare(&format!(
                "SELECT DISTINCT directory_path FROM file_record WHERE directory_path IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get(0))?;
            for path in rows {
                non_empty.insert(path?);
            }
        }
        debug!(
            "{} of {} directories still hold files",
            non_empty.len(),
            directories.len()
        );
        Ok(non_empty)
    }
}

impl DirectoryEntryStore for Database {
    fn find_by_path(&self, directory_path: &str) -> Result<Option<DirectoryEntry>, Error> {
        let entry = self
            .connection()
            .query_row(
                &format!(
                    "SELECT {} FROM directory_entry WHERE directory_path = ?1",
                    DIRECTORY_ENTRY_COLUMNS
                ),
                params![directory_path],
                directory_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn find_by_paths(&self, directory_paths: &[String]) -> Result<Vec<DirectoryEntry>, Error> {
        let mut entries = Vec::new();
        for chunk in directory_paths.chunks(MAX_BATCH_PARAMETERS) {
            let mut stmt = self.connection().prepare(&format!(
                "SELECT {} FROM directory_entry WHERE directory_path IN ({})",
                DIRECTORY_ENTRY_COLUMNS,
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), directory_entry_from_row)?;
            for entry in rows {
                entries.push(entry?);
            }
        }
        Ok(entries)
    }

    fn save_directory_entry(&self, entry: &DirectoryEntry) -> Result<i64, Error> {
        let at = format_timestamp(entry.last_modified_at);
        if entry.id == 0 {
            self.connection().execute(
                "INSERT INTO directory_entry (directory_path, partition_token, last_modified_at) \
                 VALUES (?1, ?2, ?3)",
                params![entry.directory_path, entry.partition_token, at],
            )?;
            Ok(self.connection().last_insert_rowid())
        } else {
            self.connection().execute(
                "UPDATE directory_entry SET partition_token = ?1, last_modified_at = ?2 \
                 WHERE id = ?3",
                params![entry.partition_token, at, entry.id],
            )?;
            Ok(entry.id)
        }
    }

    fn touch_entries(&self, ids: &[i64], at: DateTime<Utc>) -> Result<usize, Error> {
        let at = format_timestamp(at);
        let mut touched = 0;
        for chunk in ids.chunks(MAX_BATCH_PARAMETERS) {
            let mut values: Vec<Value> = Vec::with_capacity(chunk.len() + 1);
            values.push(Value::Text(at.clone()));
            values.extend(chunk.iter().map(|id| Value::Integer(*id)));
            touched += self.connection().execute(
                &format!(
                    "UPDATE directory_entry SET last_modified_at = ? WHERE id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(values.iter()),
            )?;
        }
        Ok(touched)
    }

    fn delete_all(&self, ids: &[i64]) -> Result<usize, Error> {
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_BATCH_PARAMETERS) {
            deleted += self.connection().execute(
                &format!(
                    "DELETE FROM directory_entry WHERE id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(deleted)
    }
}

impl Database {
    // ── Listings ─────────────────────────────────────────────────

    pub fn list_file_records(&self) -> Result<Vec<FileRecord>, Error> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {} FROM file_record ORDER BY directory_path, file_name",
            FILE_RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map([], file_record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn list_directory_entries(&self) -> Result<Vec<DirectoryEntry>, Error> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {} FROM directory_entry ORDER BY directory_path",
            DIRECTORY_ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], directory_entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    // ── Commit Log ───────────────────────────────────────────────

    pub fn insert_commit_log(&self, entry: &CommitLogEntry) -> Result<i64, Error> {
        self.connection().execute(
            "INSERT INTO commit_log \
             (repository_name, repository_url, git_ref, commit_id, message, partition_token, \
              added_files, modified_files, removed_files, received_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entry.repository_name,
                entry.repository_url,
                entry.git_ref,
                entry.commit_id,
                entry.message,
                entry.partition_token,
                serde_json::to_string(&entry.added)?,
                serde_json::to_string(&entry.modified)?,
                serde_json::to_string(&entry.removed)?,
                format_timestamp(entry.received_at),
            ],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    /// Most recent commits first.
    pub fn list_commit_log(&self, limit: i64) -> Result<Vec<CommitLogEntry>, Error> {
        let mut stmt = self.connection().prepare(
            "SELECT id, repository_name, repository_url, git_ref, commit_id, message, \
                    partition_token, added_files, modified_files, removed_files, received_at \
             FROM commit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(CommitLogEntry {
                    id: row.get(0)?,
                    repository_name: row.get(1)?,
                    repository_url: row.get(2)?,
                    git_ref: row.get(3)?,
                    commit_id: row.get(4)?,
                    message: row.get(5)?,
                    partition_token: row.get(6)?,
                    added: json_list_column(row, 7)?,
                    modified: json_list_column(row, 8)?,
                    removed: json_list_column(row, 9)?,
                    received_at: timestamp_column(row, 10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
