use regscout_checkpoint::CheckpointError;
use regscout_client::ClientError;
use regscout_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the orchestration engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Checkpoint persistence failure.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Registry driver failure that exhausted its retries.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Configuration failure (path resolution).
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O failure on an output file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure writing an export record.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;
