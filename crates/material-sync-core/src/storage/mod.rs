pub mod models;
mod queries;
mod sqlite;
pub mod store;

pub use queries::MAX_BATCH_PARAMETERS;
pub use sqlite::{Database, SCHEMA_VERSION};
pub use store::{DirectoryEntryStore, FileRecordStore};
