use regscout_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by checkpoint persistence.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// I/O failure reading or writing a checkpoint file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted file did not parse as the expected JSON shape.
    #[error("corrupt checkpoint file {path}: {source}")]
    Corrupt {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize in-memory state.
    #[error("failed to serialize checkpoint state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to resolve a data directory.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl CheckpointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using `CheckpointError`.
pub type Result<T> = std::result::Result<T, CheckpointError>;
