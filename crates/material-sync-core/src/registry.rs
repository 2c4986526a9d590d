use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::storage::models::{truncate_to_seconds, DirectoryEntry};
use crate::storage::{DirectoryEntryStore, FileRecordStore};

/// Lifecycle of directory aggregate entries.
///
/// Entries are created on demand, refreshed in one batched update per batch,
/// and deleted in one batched pass once no file record references them.
pub struct DirectoryRegistry<'a, S> {
    store: &'a S,
    /// Paths already resolved in this batch, so each is looked up at most once.
    resolved: AHashMap<String, i64>,
    created: usize,
}

impl<'a, S> DirectoryRegistry<'a, S>
where
    S: DirectoryEntryStore + FileRecordStore,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            resolved: AHashMap::new(),
            created: 0,
        }
    }

    /// Entries created through this registry so far.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn get_or_create(
        &mut self,
        directory_path: &str,
        partition_token: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, Error> {
        if let Some(id) = self.resolved.get(directory_path) {
            return Ok(*id);
        }

        let id = match self.store.find_by_path(directory_path)? {
            Some(entry) => entry.id,
            None => {
                let entry = DirectoryEntry {
                    id: 0,
                    directory_path: directory_path.to_string(),
                    partition_token: partition_token.to_string(),
                    last_modified_at: truncate_to_seconds(now),
                };
                let id = self.store.save_directory_entry(&entry)?;
                self.created += 1;
                debug!("Created directory entry {} for {}", id, directory_path);
                id
            }
        };

        self.resolved.insert(directory_path.to_string(), id);
        Ok(id)
    }

    /// Refresh `last_modified_at` for every path that has an entry. Paths with
    /// no entry are logged and skipped.
    pub fn touch(&self, paths: &AHashSet<String>, now: DateTime<Utc>) -> Result<usize, Error> {
        if paths.is_empty() {
            return Ok(0);
        }

        let wanted = sorted(paths);
        let entries = self.store.find_by_paths(&wanted)?;

        let found: AHashSet<&str> = entries.iter().map(|e| e.directory_path.as_str()).collect();
        for path in wanted.iter().filter(|p| !found.contains(p.as_str())) {
            warn!("Directory not found in registry, skipping touch: {}", path);
        }

        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let touched = self.store.touch_entries(&ids, now)?;
        debug!("Touched {} directory entries", touched);
        Ok(touched)
    }

    /// Delete the entries for those of `paths` that no file record references
    /// any more. Returns the pruned paths.
    pub fn prune_if_empty(&self, paths: &AHashSet<String>) -> Result<Vec<String>, Error> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = sorted(paths);
        let non_empty = self.store.non_empty_directories_among(&candidates)?;
        let empty: Vec<String> = candidates
            .into_iter()
            .filter(|path| !non_empty.contains(path))
            .collect();
        if empty.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self.store.find_by_paths(&empty)?;
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        self.store.delete_all(&ids)?;

        let mut pruned: Vec<String> = entries.into_iter().map(|e| e.directory_path).collect();
        pruned.sort();
        for path in &pruned {
            info!("Deleted directory entry: {}", path);
        }
        Ok(pruned)
    }
}

fn sorted(paths: &AHashSet<String>) -> Vec<String> {
    let mut list: Vec<String> = paths.iter().cloned().collect();
    list.sort();
    list
}
