use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Error;
use crate::partition::{FixedPartition, PartitionResolver};
use crate::payload::PushPayload;
use crate::processor::{BatchReport, Clock, CommitEventProcessor, SystemClock};
use crate::progress::ProgressReporter;
use crate::storage::models::{truncate_to_seconds, CommitLogEntry};
use crate::storage::Database;

pub struct SyncEngine<C = SystemClock> {
    config: AppConfig,
    clock: C,
}

#[derive(Debug)]
pub struct PushSummary {
    pub duration: Duration,
    pub commits_processed: usize,
    /// Commit ids that had no partition token and were only logged.
    pub commits_skipped: Vec<String>,
    pub report: BatchReport,
}

impl SyncEngine<SystemClock> {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> SyncEngine<C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SyncEngine<C2> {
        SyncEngine {
            config: self.config,
            clock,
        }
    }

    pub fn with_db_path(mut self, path: &str) -> Self {
        self.config.database_path = path.to_string();
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolver that applies the configured partition token to every commit.
    pub fn configured_partition(&self) -> Option<FixedPartition> {
        self.config.partition_token.clone().map(FixedPartition)
    }

    pub fn open_database(&self) -> Result<Database, Error> {
        Ok(Database::open(&self.config.database_path)?)
    }

    pub fn ingest_json<R>(
        &self,
        json: &str,
        resolver: &R,
        reporter: &dyn ProgressReporter,
    ) -> Result<PushSummary, Error>
    where
        R: PartitionResolver + ?Sized,
    {
        let payload = PushPayload::from_json(json)?;
        let db = self.open_database()?;
        self.ingest(&db, &payload, resolver, reporter)
    }

    /// Apply every commit of one push as a single unit of work:
    /// 1. Record each commit in the commit log
    /// 2. Resolve its partition token (commits without one are skipped)
    /// 3. Run the commit's changes through the processor
    ///
    /// Any error rolls back the whole push.
    pub fn ingest<R>(
        &self,
        db: &Database,
        payload: &PushPayload,
        resolver: &R,
        reporter: &dyn ProgressReporter,
    ) -> Result<PushSummary, Error>
    where
        R: PartitionResolver + ?Sized,
    {
        let start = Instant::now();
        let commits = payload.commits();
        info!(
            "Processing push to {} ({}) with {} commits",
            payload.repository.name,
            payload.git_ref,
            commits.len()
        );
        reporter.on_push_start(&payload.repository.name, commits.len());

        let tx = db.connection().unchecked_transaction()?;
        let processor = CommitEventProcessor::with_clock(db, &self.clock);

        let mut report = BatchReport::default();
        let mut commits_processed = 0;
        let mut commits_skipped = Vec::new();

        for commit in &commits {
            let token = resolver.resolve(payload, commit);

            db.insert_commit_log(&CommitLogEntry {
                id: 0,
                repository_name: payload.repository.name.clone(),
                repository_url: payload.repository.url.clone(),
                git_ref: payload.git_ref.clone(),
                commit_id: commit.id.clone(),
                message: commit.message.clone(),
                partition_token: token.clone(),
                added: commit.added.clone(),
                modified: commit.modified.clone(),
                removed: commit.removed.clone(),
                received_at: truncate_to_seconds(self.clock.now()),
            })?;

            let token = match token {
                Some(token) => token,
                None => {
                    warn!("No partition token for commit {}, skipping its changes", commit.id);
                    reporter.on_commit_skipped(&commit.id, "no partition token");
                    commits_skipped.push(commit.id.clone());
                    continue;
                }
            };

            let changes = commit.change_set();
            debug!("Commit {}: {} changes under '{}'", commit.id, changes.len(), token);
            reporter.on_commit_start(&commit.id, changes.len());

            let commit_report = processor.process(&changes, &token)?;
            for err in &commit_report.errors {
                reporter.on_file_error(err);
            }
            reporter.on_commit_complete(&commit.id, &commit_report);

            report.merge(commit_report);
            commits_processed += 1;
        }

        tx.commit()?;

        let duration = start.elapsed();
        reporter.on_push_complete(commits_processed, duration.as_secs_f64());
        info!(
            "Push applied in {:.2}s: {} commits, {} skipped, {} file errors",
            duration.as_secs_f64(),
            commits_processed,
            commits_skipped.len(),
            report.errors.len(),
        );

        Ok(PushSummary {
            duration,
            commits_processed,
            commits_skipped,
            report,
        })
    }
}
