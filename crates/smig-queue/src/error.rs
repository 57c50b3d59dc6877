//! Queue error types.

use std::path::PathBuf;

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue file not found: {0}")]
    NotFound(PathBuf),

    #[error("Persist failed for {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Load failed for {path}: {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl QueueError {
    pub fn persist_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistFailed {
            path: path.into(),
            source,
        }
    }

    pub fn load_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LoadFailed {
            path: path.into(),
            source,
        }
    }
}
