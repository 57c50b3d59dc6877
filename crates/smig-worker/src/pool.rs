//! Bounded worker pool that executes queue rows.
//!
//! The dispatcher registers every task on the completion latch, then feeds
//! rows through a bounded channel to a fixed set of workers. Each row runs
//! in its own task with a timeout; whatever happens to it, the latch is
//! signalled and the remaining rows keep going.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn, Instrument};

use smig_models::Task;
use smig_stream::VideoHost;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::latch::CompletionLatch;
use crate::logging::TaskLogger;
use crate::metrics::{self, outcome};
use crate::recorder::CompletionRecorder;

/// A row that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub row: String,
    pub kind: &'static str,
    pub error: String,
}

/// Result of one pool run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Rows handed to the pool
    pub total: usize,
    /// Rows skipped because a completion record already existed
    pub skipped: usize,
    /// Rows dispatched to workers
    pub dispatched: usize,
    /// Rows that produced a completion record
    pub completed: usize,
    pub failed: Vec<FailedTask>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Shared, read-only state every task needs.
struct TaskContext {
    host: Arc<dyn VideoHost>,
    recorder: Arc<CompletionRecorder>,
    root_dir: PathBuf,
    task_timeout: Duration,
}

#[derive(Default)]
struct WorkerTally {
    completed: usize,
    failed: Vec<FailedTask>,
}

/// Fixed-size pool of migration workers.
pub struct WorkerPool {
    config: WorkerConfig,
    host: Arc<dyn VideoHost>,
    recorder: Arc<CompletionRecorder>,
}

impl WorkerPool {
    pub fn new(
        config: WorkerConfig,
        host: Arc<dyn VideoHost>,
        recorder: Arc<CompletionRecorder>,
    ) -> Self {
        Self {
            config,
            host,
            recorder,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Execute every row and return once all of them have finished.
    pub async fn run(&self, rows: Vec<String>) -> RunSummary {
        let mut summary = RunSummary {
            total: rows.len(),
            ..Default::default()
        };

        let pending = self.filter_completed(rows, &mut summary).await;
        summary.dispatched = pending.len();

        if pending.is_empty() {
            info!(
                total = summary.total,
                skipped = summary.skipped,
                "No tasks to dispatch"
            );
            return summary;
        }

        let worker_count = self.config.max_workers.max(1);
        info!(
            tasks = pending.len(),
            workers = worker_count,
            timeout_secs = self.config.task_timeout.as_secs(),
            "Starting worker pool"
        );

        let started = Instant::now();
        let latch = Arc::new(CompletionLatch::new());
        // Full count goes in before the first send.
        latch.add(pending.len());

        let ctx = Arc::new(TaskContext {
            host: Arc::clone(&self.host),
            recorder: Arc::clone(&self.recorder),
            root_dir: self.config.root_dir.clone(),
            task_timeout: self.config.task_timeout,
        });

        let (tx, rx) = mpsc::channel::<String>(worker_count);
        let rx = Arc::new(Mutex::new(rx));

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let ctx = Arc::clone(&ctx);
                let latch = Arc::clone(&latch);
                tokio::spawn(worker_loop(worker_id, rx, ctx, latch))
            })
            .collect();

        let mut undelivered = Vec::new();
        let mut rows = pending.into_iter();
        while let Some(row) = rows.next() {
            if let Err(mpsc::error::SendError(row)) = tx.send(row).await {
                error!("All workers exited before dispatch finished");
                undelivered.push(row);
                undelivered.extend(rows.by_ref());
            }
        }
        drop(tx);

        for row in undelivered {
            summary.failed.push(failed_task(row, &WorkerError::PoolClosed));
            metrics::record_task(outcome::FAILED);
            latch.done();
        }

        latch.wait().await;

        for handle in handles {
            match handle.await {
                Ok(tally) => {
                    summary.completed += tally.completed;
                    summary.failed.extend(tally.failed);
                }
                Err(e) => error!("Worker exited abnormally: {}", e),
            }
        }

        info!(
            completed = summary.completed,
            failed = summary.failed.len(),
            skipped = summary.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Worker pool finished"
        );

        summary
    }

    async fn filter_completed(&self, rows: Vec<String>, summary: &mut RunSummary) -> Vec<String> {
        if !self.config.skip_completed {
            return rows;
        }

        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            match self.recorder.is_row_recorded(&row).await {
                Ok(true) => {
                    TaskLogger::from_row(&row, "skip").log_progress("completion record exists");
                    summary.skipped += 1;
                }
                Ok(false) => pending.push(row),
                Err(e) => {
                    // Unknown state: dispatch and let the task decide.
                    TaskLogger::from_row(&row, "skip")
                        .log_warning(&format!("dispatching anyway: {}", e));
                    pending.push(row);
                }
            }
        }
        metrics::record_tasks(outcome::SKIPPED, summary.skipped);
        pending
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    ctx: Arc<TaskContext>,
    latch: Arc<CompletionLatch>,
) -> WorkerTally {
    let mut tally = WorkerTally::default();

    loop {
        // Hold the lock only while receiving.
        let row = { rx.lock().await.recv().await };
        let Some(row) = row else { break };

        let _guard = latch.guard();
        match run_isolated(row.clone(), Arc::clone(&ctx)).await {
            Ok(_) => {
                tally.completed += 1;
                metrics::record_task(outcome::COMPLETED);
            }
            Err(e) => {
                let label = if matches!(e, WorkerError::Timeout(_)) {
                    outcome::TIMEOUT
                } else {
                    outcome::FAILED
                };
                metrics::record_task(label);
                TaskLogger::from_row(&row, "migrate")
                    .log_error(&format!("worker {} failed row '{}': {}", worker_id, row, e));
                tally.failed.push(failed_task(row, &e));
            }
        }
    }

    tally
}

/// Run one row in its own task so a panic or hang cannot take the worker down.
async fn run_isolated(row: String, ctx: Arc<TaskContext>) -> WorkerResult<PathBuf> {
    let timeout = ctx.task_timeout;
    let handle = tokio::spawn(async move {
        match tokio::time::timeout(timeout, process_row(&row, &ctx)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(timeout)),
        }
    });

    match handle.await {
        Ok(result) => result,
        Err(e) => Err(WorkerError::Io(std::io::Error::other(format!(
            "task aborted: {}",
            e
        )))),
    }
}

/// Create the remote video, upload the renamed file, and record completion.
async fn process_row(row: &str, ctx: &TaskContext) -> WorkerResult<PathBuf> {
    let task = Task::from_row(row)?;
    let logger = TaskLogger::new(&task, "migrate");
    let span = logger.create_span();

    async {
        logger.log_start(&task.file_name());

        let remote_id = ctx.host.create_video(task.token.as_str()).await?;
        logger.log_progress(&format!("created remote video {}", remote_id));

        let path = task.source_path(&ctx.root_dir);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| WorkerError::read_source(&path, e))?;
        let size = bytes.len();

        ctx.host.upload_video(&remote_id, bytes).await?;
        logger.log_progress(&format!("uploaded {} bytes", size));

        let task = task.with_remote_id(remote_id);
        let record = ctx.recorder.record(&task).await?;

        logger.log_completion(&record.display().to_string());
        Ok::<_, WorkerError>(record)
    }
    .instrument(span)
    .await
}

fn failed_task(row: String, error: &WorkerError) -> FailedTask {
    if matches!(error, WorkerError::PoolClosed) {
        warn!(row = %row, "Row was never dispatched");
    }
    FailedTask {
        row,
        kind: error.kind(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use smig_models::RemoteVideoId;
    use smig_stream::{StreamError, StreamResult};
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeHost {
        delay: Duration,
        fail_create: HashSet<String>,
        hang_create: HashSet<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        uploads: std::sync::Mutex<Vec<(String, usize)>>,
    }

    impl FakeHost {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl VideoHost for FakeHost {
        async fn create_video(&self, title: &str) -> StreamResult<RemoteVideoId> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if self.hang_create.contains(title) {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_create.contains(title) {
                return Err(StreamError::status("create_video", 500, "boom"));
            }
            Ok(RemoteVideoId::from_string(format!("guid-{}", title)))
        }

        async fn upload_video(&self, remote_id: &RemoteVideoId, bytes: Vec<u8>) -> StreamResult<()> {
            self.uploads
                .lock()
                .unwrap()
                .push((remote_id.to_string(), bytes.len()));
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        rows: Vec<String>,
    }

    impl Fixture {
        fn root(&self) -> PathBuf {
            self.dir.path().join("mainnet")
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("output")
        }

        fn config(&self, max_workers: usize) -> WorkerConfig {
            WorkerConfig {
                max_workers,
                task_timeout: Duration::from_secs(5),
                output_dir: self.output(),
                root_dir: self.root(),
                skip_completed: true,
            }
        }
    }

    /// Lay out renamed files and matching queue rows.
    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut rows = Vec::new();
        for (owner, token) in files {
            let owner_dir = dir.path().join("mainnet").join(owner);
            std::fs::create_dir_all(&owner_dir).unwrap();
            std::fs::write(owner_dir.join(format!("{}.mp4", token)), token.as_bytes()).unwrap();
            rows.push(format!("{},{},mp4", owner, token));
        }
        std::fs::create_dir_all(dir.path().join("output")).unwrap();
        Fixture { dir, rows }
    }

    fn pool(config: WorkerConfig, host: Arc<FakeHost>) -> WorkerPool {
        let recorder = Arc::new(CompletionRecorder::new(config.output_dir.clone()));
        WorkerPool::new(config, host, recorder)
    }

    fn read_record(output: &Path, name: &str) -> String {
        std::fs::read_to_string(output.join(name)).unwrap()
    }

    #[tokio::test]
    async fn test_all_rows_complete() {
        let fx = fixture(&[("alice", "t1"), ("alice", "t2"), ("bob", "t3")]);
        let host = Arc::new(FakeHost::default());

        let summary = pool(fx.config(2), Arc::clone(&host)).run(fx.rows.clone()).await;

        assert!(summary.is_success());
        assert_eq!(summary.completed, 3);
        assert_eq!(read_record(&fx.output(), "alice_t1.txt"), "alice,t1,mp4,guid-t1");
        assert_eq!(read_record(&fx.output(), "bob_t3.txt"), "bob,t3,mp4,guid-t3");

        let uploads = host.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 3);
        assert!(uploads.contains(&("guid-t2".to_string(), 2)));
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_worker_count() {
        let files: Vec<(String, String)> = (0..12)
            .map(|i| ("owner".to_string(), format!("tok{}", i)))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(o, t)| (o.as_str(), t.as_str())).collect();
        let fx = fixture(&refs);
        let host = Arc::new(FakeHost::with_delay(Duration::from_millis(30)));

        let summary = pool(fx.config(3), Arc::clone(&host)).run(fx.rows.clone()).await;

        assert_eq!(summary.completed, 12);
        let max = host.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "observed {} concurrent calls", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn test_failed_create_is_isolated() {
        let fx = fixture(&[("alice", "t1"), ("alice", "bad"), ("bob", "t3")]);
        let host = Arc::new(FakeHost {
            fail_create: HashSet::from(["bad".to_string()]),
            ..Default::default()
        });

        let summary = pool(fx.config(2), host).run(fx.rows.clone()).await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].row, "alice,bad,mp4");
        assert_eq!(summary.failed[0].kind, "remote");
        assert!(!fx.output().join("alice_bad.txt").exists());
        assert!(fx.output().join("bob_t3.txt").exists());
    }

    #[tokio::test]
    async fn test_hung_task_times_out() {
        let fx = fixture(&[("alice", "t1"), ("alice", "stuck")]);
        let host = Arc::new(FakeHost {
            hang_create: HashSet::from(["stuck".to_string()]),
            ..Default::default()
        });
        let mut config = fx.config(2);
        config.task_timeout = Duration::from_millis(200);

        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            pool(config, host).run(fx.rows.clone()),
        )
        .await
        .expect("pool must not wait on a hung task");

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].kind, "timeout");
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let fx = fixture(&[]);
        let host = Arc::new(FakeHost::default());

        let summary = pool(fx.config(5), Arc::clone(&host)).run(Vec::new()).await;

        assert_eq!(summary.total, 0);
        assert!(summary.is_success());
        assert!(host.uploads.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(fx.output()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_file_fails_row() {
        let fx = fixture(&[("alice", "t1")]);
        let host = Arc::new(FakeHost::default());
        let mut rows = fx.rows.clone();
        rows.push("alice,ghost,mp4".to_string());

        let summary = pool(fx.config(2), Arc::clone(&host)).run(rows).await;

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].kind, "read_source");
        // Created remotely but never uploaded or recorded.
        assert_eq!(host.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_row_fails_row() {
        let fx = fixture(&[("alice", "t1")]);
        let mut rows = fx.rows.clone();
        rows.push("not-a-row".to_string());

        let summary = pool(fx.config(1), Arc::new(FakeHost::default())).run(rows).await;

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed[0].kind, "invalid_row");
    }

    #[tokio::test]
    async fn test_skip_completed_rows() {
        let fx = fixture(&[("alice", "t1"), ("bob", "t2")]);
        std::fs::write(fx.output().join("alice_t1.txt"), "alice,t1,mp4,old-guid").unwrap();
        let host = Arc::new(FakeHost::default());

        let summary = pool(fx.config(2), Arc::clone(&host)).run(fx.rows.clone()).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(read_record(&fx.output(), "alice_t1.txt"), "alice,t1,mp4,old-guid");
        assert_eq!(host.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_record_state_still_dispatches() {
        let fx = fixture(&[("alice", "t1")]);
        std::fs::remove_dir(fx.output()).unwrap();
        std::fs::write(fx.output(), b"not a directory").unwrap();
        let host = Arc::new(FakeHost::default());

        let summary = pool(fx.config(1), Arc::clone(&host)).run(fx.rows.clone()).await;

        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].kind, "record");
        assert_eq!(host.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reprocess_when_skip_disabled() {
        let fx = fixture(&[("alice", "t1")]);
        std::fs::write(fx.output().join("alice_t1.txt"), "alice,t1,mp4,old-guid").unwrap();
        let mut config = fx.config(1);
        config.skip_completed = false;

        let summary = pool(config, Arc::new(FakeHost::default())).run(fx.rows.clone()).await;

        assert_eq!(summary.skipped, 0);
        assert_eq!(read_record(&fx.output(), "alice_t1.txt"), "alice,t1,mp4,guid-t1");
    }
}
