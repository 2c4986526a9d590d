use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classifier::MaterialCategory;

/// Last event recorded for a file. Removal deletes the record instead of
/// storing a tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Added,
    Updated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Added => "ADDED",
            EventKind::Updated => "UPDATED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADDED" => Ok(EventKind::Added),
            "UPDATED" => Ok(EventKind::Updated),
            other => Err(format!("unknown event kind '{}'", other)),
        }
    }
}

/// One tracked file. `id == 0` means the record has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub directory_path: String,
    pub file_name: String,
    pub material_category: MaterialCategory,
    pub last_event: EventKind,
    pub last_event_at: DateTime<Utc>,
    pub partition_token: String,
    pub directory_id: i64,
}

/// Directory aggregate, reference-counted by the file records beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: i64,
    pub directory_path: String,
    pub partition_token: String,
    pub last_modified_at: DateTime<Utc>,
}

/// Audit row for one ingested commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitLogEntry {
    pub id: i64,
    pub repository_name: String,
    pub repository_url: String,
    pub git_ref: String,
    pub commit_id: String,
    pub message: String,
    pub partition_token: Option<String>,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
    pub received_at: DateTime<Utc>,
}

/// Stored timestamps carry whole seconds only.
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    truncate_to_seconds(ts).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| truncate_to_seconds(ts.with_timezone(&Utc)))
}

fn from_text<T>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .as_str()?
        .parse()
        .map_err(|e: String| FromSqlError::Other(e.into()))
}

impl ToSql for MaterialCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MaterialCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        from_text(value)
    }
}

impl ToSql for EventKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for EventKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        from_text(value)
    }
}
