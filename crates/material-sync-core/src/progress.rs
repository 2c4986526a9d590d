use crate::processor::{BatchReport, FileError};

/// Trait for reporting ingest progress.
///
/// The CLI implements it with tracing and colored output. All methods have
/// default no-op implementations.
pub trait ProgressReporter {
    fn on_push_start(&self, _repository: &str, _commits: usize) {}
    fn on_commit_start(&self, _commit_id: &str, _changes: usize) {}
    fn on_file_error(&self, _error: &FileError) {}
    fn on_commit_skipped(&self, _commit_id: &str, _reason: &str) {}
    fn on_commit_complete(&self, _commit_id: &str, _report: &BatchReport) {}
    fn on_push_complete(&self, _commits: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
