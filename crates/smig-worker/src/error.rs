//! Worker error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue file {0} already exists; scanning an already processed tree is not supported")]
    QueueExists(PathBuf),

    #[error("Failed to read source file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write completion record {path}: {source}")]
    RecordFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to check completion record {path}: {source}")]
    RecordCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task timed out after {0:?}")]
    Timeout(Duration),

    #[error("Worker pool closed before the task could be dispatched")]
    PoolClosed,

    #[error("Invalid task row: {0}")]
    Model(#[from] smig_models::ModelError),

    #[error("Scan error: {0}")]
    Catalog(#[from] smig_catalog::CatalogError),

    #[error("Queue error: {0}")]
    Queue(#[from] smig_queue::QueueError),

    #[error("Stream error: {0}")]
    Stream(#[from] smig_stream::StreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn read_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadSource {
            path: path.into(),
            source,
        }
    }

    pub fn record_check(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RecordCheck {
            path: path.into(),
            source,
        }
    }

    pub fn record_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RecordFailed {
            path: path.into(),
            source,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::ConfigError(_) => "config",
            WorkerError::QueueExists(_) => "queue_exists",
            WorkerError::ReadSource { .. } => "read_source",
            WorkerError::RecordFailed { .. } => "record",
            WorkerError::RecordCheck { .. } => "record_check",
            WorkerError::Timeout(_) => "timeout",
            WorkerError::PoolClosed => "pool_closed",
            WorkerError::Model(_) => "invalid_row",
            WorkerError::Catalog(_) => "scan",
            WorkerError::Queue(_) => "queue",
            WorkerError::Stream(_) => "remote",
            WorkerError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_kinds() {
        assert_eq!(
            WorkerError::Stream(smig_stream::StreamError::status("create_video", 500, "")).kind(),
            "remote"
        );
        assert_eq!(
            WorkerError::read_source("x", std::io::Error::from(std::io::ErrorKind::NotFound)).kind(),
            "read_source"
        );
        assert_eq!(
            WorkerError::record_check("out", std::io::Error::from(std::io::ErrorKind::NotADirectory))
                .kind(),
            "record_check"
        );
    }

    #[test]
    fn test_phase_error_kinds() {
        assert_eq!(WorkerError::config_error("missing").kind(), "config");
        assert_eq!(WorkerError::QueueExists(PathBuf::from("to_upload.csv")).kind(), "queue_exists");
        assert_eq!(
            WorkerError::Queue(smig_queue::QueueError::NotFound(PathBuf::from("q"))).kind(),
            "queue"
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(WorkerError::Timeout(Duration::from_secs(1)).kind(), "timeout");
        assert_eq!(WorkerError::PoolClosed.kind(), "pool_closed");
    }
}
