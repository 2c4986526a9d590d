use colored::*;
use material_sync_core::processor::{BatchReport, FileError};
use material_sync_core::ProgressReporter;

/// Prints one line per commit and per failed file.
pub struct CliReporter;

impl ProgressReporter for CliReporter {
    fn on_push_start(&self, repository: &str, commits: usize) {
        eprintln!("{} {} ({} commits)", "Ingesting".cyan(), repository, commits);
    }

    fn on_file_error(&self, error: &FileError) {
        eprintln!(
            "  {} {} {}: {}",
            "✗".red(),
            error.action,
            error.path,
            error.message
        );
    }

    fn on_commit_skipped(&self, commit_id: &str, reason: &str) {
        eprintln!("  {} {} skipped: {}", "-".yellow(), commit_id, reason);
    }

    fn on_commit_complete(&self, commit_id: &str, report: &BatchReport) {
        eprintln!(
            "  {} {}: {} created, {} updated, {} deleted, {} directories pruned",
            "✓".green(),
            commit_id,
            report.records_created,
            report.records_updated,
            report.records_deleted,
            report.directories_pruned.len(),
        );
    }

    fn on_push_complete(&self, commits: usize, duration_secs: f64) {
        eprintln!(
            "{} {} commits in {:.2}s",
            "Done:".green(),
            commits,
            duration_secs
        );
    }
}
