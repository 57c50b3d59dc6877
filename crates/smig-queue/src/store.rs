//! Queue file store.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use smig_models::Task;

use crate::error::{QueueError, QueueResult};

/// Default queue file name, relative to the working directory.
pub const DEFAULT_QUEUE_FILE: &str = "to_upload.csv";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Path of the queue file
    pub path: PathBuf,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_QUEUE_FILE),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("MIGRATE_QUEUE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUEUE_FILE)),
        }
    }
}

/// Queue file store.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the queue file has already been written.
    ///
    /// An error while checking is returned, not treated as absence.
    pub async fn exists(&self) -> QueueResult<bool> {
        fs::try_exists(&self.path)
            .await
            .map_err(|e| QueueError::load_failed(&self.path, e))
    }

    /// Write one row per task, replacing any previous queue file.
    ///
    /// Rows are written to a sibling temp file which is synced and then
    /// renamed over the target, so readers never observe a half-written
    /// queue. Returns the number of rows written.
    pub async fn persist(&self, tasks: &[Task]) -> QueueResult<usize> {
        let tmp_path = self.tmp_path();
        let err = |e: std::io::Error| QueueError::persist_failed(&self.path, e);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(err)?;
        }

        let file = fs::File::create(&tmp_path).await.map_err(err)?;
        let mut writer = BufWriter::new(file);
        for task in tasks {
            writer.write_all(task.to_row().as_bytes()).await.map_err(err)?;
            writer.write_all(b"\n").await.map_err(err)?;
        }
        writer.flush().await.map_err(err)?;
        writer.get_ref().sync_all().await.map_err(err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).await.map_err(err)?;

        info!(path = %self.path.display(), rows = tasks.len(), "Queue persisted");
        Ok(tasks.len())
    }

    /// Read the rows back in file order.
    ///
    /// Rows are returned as opaque strings; workers parse them. Blank lines
    /// are skipped and a trailing `\r` is removed.
    pub async fn load(&self) -> QueueResult<Vec<String>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QueueError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(QueueError::load_failed(&self.path, e)),
        };

        let rows: Vec<String> = contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect();

        debug!(path = %self.path.display(), rows = rows.len(), "Queue loaded");
        Ok(rows)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
