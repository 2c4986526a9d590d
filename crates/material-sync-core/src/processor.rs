use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::classifier;
use crate::error::Error;
use crate::path::ChangePath;
use crate::registry::DirectoryRegistry;
use crate::storage::models::{truncate_to_seconds, EventKind, FileRecord};
use crate::storage::{DirectoryEntryStore, FileRecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeAction {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Added => f.write_str("added"),
            ChangeAction::Modified => f.write_str("modified"),
            ChangeAction::Removed => f.write_str("removed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChange<'a> {
    pub path: &'a str,
    pub action: ChangeAction,
}

/// The three path lists of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// All added paths, then all modified, then all removed.
    pub fn changes(&self) -> impl Iterator<Item = FileChange<'_>> {
        tagged(&self.added, ChangeAction::Added)
            .chain(tagged(&self.modified, ChangeAction::Modified))
            .chain(tagged(&self.removed, ChangeAction::Removed))
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tagged(paths: &[String], action: ChangeAction) -> impl Iterator<Item = FileChange<'_>> {
    paths.iter().map(move |p| FileChange {
        path: p.as_str(),
        action,
    })
}

/// A single file that could not be processed. The rest of the batch went ahead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: String,
    pub action: ChangeAction,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub records_created: usize,
    pub records_updated: usize,
    pub records_deleted: usize,
    pub removals_without_record: usize,
    pub directories_created: usize,
    pub directories_touched: usize,
    pub directories_pruned: Vec<String>,
    pub errors: Vec<FileError>,
}

impl BatchReport {
    pub fn merge(&mut self, other: BatchReport) {
        self.records_created += other.records_created;
        self.records_updated += other.records_updated;
        self.records_deleted += other.records_deleted;
        self.removals_without_record += other.removals_without_record;
        self.directories_created += other.directories_created;
        self.directories_touched += other.directories_touched;
        self.directories_pruned.extend(other.directories_pruned);
        self.errors.extend(other.errors);
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

enum Outcome {
    Created,
    Updated,
    Deleted,
    NotFound,
}

struct Accumulators {
    touched: AHashSet<String>,
    removed_from: AHashSet<String>,
}

/// Applies one commit's changes to the file records and directory registry.
pub struct CommitEventProcessor<'a, S, C = SystemClock> {
    store: &'a S,
    clock: C,
}

impl<'a, S> CommitEventProcessor<'a, S, SystemClock>
where
    S: FileRecordStore + DirectoryEntryStore,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<'a, S, C> CommitEventProcessor<'a, S, C>
where
    S: FileRecordStore + DirectoryEntryStore,
    C: Clock,
{
    pub fn with_clock(store: &'a S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Process every change in order, then touch and prune the affected
    /// directories once each.
    ///
    /// Per-file failures land in [`BatchReport::errors`]. A failing directory
    /// step returns [`Error::BatchConsistency`] and the caller must roll back.
    pub fn process(&self, changes: &ChangeSet, partition_token: &str) -> Result<BatchReport, Error> {
        let mut registry = DirectoryRegistry::new(self.store);
        let mut report = BatchReport::default();
        let mut acc = Accumulators {
            touched: AHashSet::new(),
            removed_from: AHashSet::new(),
        };

        for change in changes.changes() {
            let result = match change.action {
                ChangeAction::Added | ChangeAction::Modified => {
                    self.upsert(change, partition_token, &mut registry, &mut acc)
                }
                ChangeAction::Removed => self.remove(change, &mut acc),
            };

            match result {
                Ok(Outcome::Created) => report.records_created += 1,
                Ok(Outcome::Updated) => report.records_updated += 1,
                Ok(Outcome::Deleted) => report.records_deleted += 1,
                Ok(Outcome::NotFound) => report.removals_without_record += 1,
                Err(err @ Error::BatchConsistency { .. }) => return Err(err),
                Err(err) => {
                    error!("Error processing {} file '{}': {}", change.action, change.path, err);
                    report.errors.push(FileError {
                        path: change.path.to_string(),
                        action: change.action,
                        message: err.to_string(),
                    });
                }
            }
        }

        report.directories_created = registry.created();
        report.directories_touched = registry
            .touch(&acc.touched, self.clock.now())
            .map_err(|e| Error::batch_fault("touch", e))?;
        report.directories_pruned = registry
            .prune_if_empty(&acc.removed_from)
            .map_err(|e| Error::batch_fault("prune", e))?;

        info!(
            "Batch done: {} created, {} updated, {} deleted, {} directories pruned, {} errors",
            report.records_created,
            report.records_updated,
            report.records_deleted,
            report.directories_pruned.len(),
            report.errors.len(),
        );
        Ok(report)
    }

    fn upsert(
        &self,
        change: FileChange<'_>,
        partition_token: &str,
        registry: &mut DirectoryRegistry<'_, S>,
        acc: &mut Accumulators,
    ) -> Result<Outcome, Error> {
        let parsed = ChangePath::parse(change.path)?;
        let category = classifier::classify(change.path);
        let event = match change.action {
            ChangeAction::Added => EventKind::Added,
            _ => EventKind::Updated,
        };
        let now = truncate_to_seconds(self.clock.now());

        let outcome = match self
            .store
            .find_by_directory_and_name(&parsed.directory_path, &parsed.file_name)?
        {
            Some(mut record) => {
                record.material_category = category;
                record.last_event = event;
                record.last_event_at = now;
                record.partition_token = partition_token.to_string();
                self.store.save_file_record(&record)?;
                debug!("Updated {}{} ({})", record.directory_path, record.file_name, event);
                Outcome::Updated
            }
            None => {
                let directory_id = registry
                    .get_or_create(&parsed.directory_path, partition_token, now)
                    .map_err(|e| Error::batch_fault("get_or_create", e))?;
                let record = FileRecord {
                    id: 0,
                    directory_path: parsed.directory_path.clone(),
                    file_name: parsed.file_name,
                    material_category: category,
                    last_event: event,
                    last_event_at: now,
                    partition_token: partition_token.to_string(),
                    directory_id,
                };
                let id = match self.store.save_file_record(&record) {
                    Ok(id) => id,
                    Err(err) => {
                        // The entry may have been created just for this file.
                        acc.removed_from.insert(record.directory_path);
                        return Err(err);
                    }
                };
                debug!(
                    "Created file record {} for {}{} as {}",
                    id, record.directory_path, record.file_name, category
                );
                Outcome::Created
            }
        };

        acc.touched.insert(parsed.directory_path);
        Ok(outcome)
    }

    fn remove(&self, change: FileChange<'_>, acc: &mut Accumulators) -> Result<Outcome, Error> {
        let parsed = ChangePath::parse(change.path)?;
        match self
            .store
            .find_by_directory_and_name(&parsed.directory_path, &parsed.file_name)?
        {
            Some(record) => {
                self.store.delete_file_record(&record)?;
                debug!("Deleted file record for {}", change.path);
                acc.removed_from.insert(parsed.directory_path);
                Ok(Outcome::Deleted)
            }
            None => {
                warn!("No file record to remove for {}", change.path);
                Ok(Outcome::NotFound)
            }
        }
    }
}
