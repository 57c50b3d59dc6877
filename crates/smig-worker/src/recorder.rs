//! Completion records.
//!
//! One small file per finished task, named `<owner>_<token>.txt` and holding
//! the completed row. A task without a record did not complete.

use std::path::{Path, PathBuf};

use smig_models::Task;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Writes and checks completion records under a single output directory.
#[derive(Debug, Clone)]
pub struct CompletionRecorder {
    output_dir: PathBuf,
}

impl CompletionRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| WorkerError::record_failed(&self.output_dir, e))
    }

    /// Path of the record for `task`.
    pub fn record_path(&self, task: &Task) -> PathBuf {
        self.output_dir.join(task.completion_file_name())
    }

    /// Write the completion record for `task`.
    ///
    /// The task must carry a remote id. Content is written to a sibling temp
    /// file and renamed into place, so a record is either complete or absent.
    pub async fn record(&self, task: &Task) -> WorkerResult<PathBuf> {
        let row = task.to_completed_row()?;
        let path = self.record_path(task);
        let tmp = path.with_extension("txt.tmp");

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| WorkerError::record_failed(&tmp, e))?;
        file.write_all(row.as_bytes())
            .await
            .map_err(|e| WorkerError::record_failed(&tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| WorkerError::record_failed(&tmp, e))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| WorkerError::record_failed(&path, e))?;

        debug!(path = %path.display(), "Wrote completion record");
        Ok(path)
    }

    /// Check whether `task` already has a completion record.
    pub async fn is_recorded(&self, task: &Task) -> WorkerResult<bool> {
        let path = self.record_path(task);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| WorkerError::record_check(&path, e))
    }

    /// Like [`is_recorded`](Self::is_recorded), for a raw queue row.
    /// Rows that do not parse are never considered recorded.
    pub async fn is_row_recorded(&self, row: &str) -> WorkerResult<bool> {
        match Task::from_row(row) {
            Ok(task) => self.is_recorded(&task).await,
            Err(_) => Ok(false),
        }
    }
}
