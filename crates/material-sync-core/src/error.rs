use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A directory registry step failed; the enclosing unit of work must be rolled back.
    #[error("Batch consistency fault during {stage}: {source}")]
    BatchConsistency {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn batch_fault(stage: &'static str, source: Error) -> Self {
        Error::BatchConsistency {
            stage,
            source: Box::new(source),
        }
    }
}
