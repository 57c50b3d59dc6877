//! Two-phase migration: scan the owner tree into the queue file, then run
//! the queue through the worker pool.

use std::sync::Arc;

use tracing::info;

use smig_catalog::CatalogScanner;
use smig_queue::QueueStore;
use smig_stream::VideoHost;

use crate::config::MigrationConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pool::{RunSummary, WorkerPool};
use crate::recorder::CompletionRecorder;

/// Drives both migration phases from one resolved configuration.
pub struct Migration {
    config: MigrationConfig,
}

impl Migration {
    pub fn new(config: MigrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    fn queue(&self) -> QueueStore {
        QueueStore::from_config(&self.config.queue)
    }

    /// Scan phase: rename every eligible file and persist the queue.
    ///
    /// Refuses to run when the queue file already exists, since the tree has
    /// then already been renamed and a second pass would assign new tokens.
    pub async fn scan(&self) -> WorkerResult<usize> {
        let queue = self.queue();
        if queue.exists().await? {
            return Err(WorkerError::QueueExists(queue.path().to_path_buf()));
        }

        let scanner = CatalogScanner::new(self.config.scan.clone());
        let tasks = scanner.scan().await?;
        let written = queue.persist(&tasks).await?;

        info!(
            rows = written,
            queue = %queue.path().display(),
            "Scan phase complete"
        );
        Ok(written)
    }

    /// Execution phase: load the queue and run it through the pool.
    pub async fn execute(&self, host: Arc<dyn VideoHost>) -> WorkerResult<RunSummary> {
        let rows = self.queue().load().await?;

        let recorder = Arc::new(CompletionRecorder::new(
            self.config.worker.output_dir.clone(),
        ));
        recorder.ensure_dir().await?;

        let pool = WorkerPool::new(self.config.worker.clone(), host, recorder);
        Ok(pool.run(rows).await)
    }

    /// Both phases back to back.
    pub async fn migrate(&self, host: Arc<dyn VideoHost>) -> WorkerResult<RunSummary> {
        self.scan().await?;
        self.execute(host).await
    }
}
