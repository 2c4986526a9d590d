pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod partition;
pub mod path;
pub mod payload;
pub mod processor;
pub mod progress;
pub mod registry;
pub mod storage;

pub use classifier::MaterialCategory;
pub use config::AppConfig;
pub use engine::{PushSummary, SyncEngine};
pub use error::Error;
pub use partition::{FixedPartition, PartitionResolver};
pub use processor::{BatchReport, ChangeAction, ChangeSet, CommitEventProcessor};
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::Database;
