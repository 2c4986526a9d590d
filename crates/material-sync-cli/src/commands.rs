use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "material-sync")]
#[command(about = "Keeps course material records in step with repository pushes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a push payload (JSON file) to the material records
    Ingest {
        /// Path to the push payload
        payload: PathBuf,
        /// Partition token for every commit; overrides the configured one
        #[arg(long)]
        partition: Option<String>,
    },
    /// List tracked file records
    Files {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List directory entries
    Directories,
    /// Show the most recent ingested commits
    Commits {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Print configuration values
    PrintConfig,
    /// Truncate all database tables
    TruncateDb,
}
