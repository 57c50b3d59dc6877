//! Worker and migration configuration.
//!
//! Everything is resolved once at startup and passed down explicitly; no
//! component reads the environment while tasks are running.

use std::path::PathBuf;
use std::time::Duration;

use smig_catalog::ScanConfig;
use smig_queue::QueueConfig;
use smig_stream::StreamConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent workers
    pub max_workers: usize,
    /// Upper bound for one task (create, read, upload, record)
    pub task_timeout: Duration,
    /// Directory receiving one completion record per finished task
    pub output_dir: PathBuf,
    /// Scan root holding the renamed files
    pub root_dir: PathBuf,
    /// Skip rows that already have a completion record
    pub skip_completed: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            task_timeout: Duration::from_secs(900), // 15 minutes
            output_dir: PathBuf::from("output"),
            root_dir: PathBuf::from("mainnet"),
            skip_completed: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_workers: std::env::var("MIGRATE_MAX_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(5),
            task_timeout: Duration::from_secs(
                std::env::var("MIGRATE_TASK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            output_dir: std::env::var("MIGRATE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            root_dir: std::env::var("MIGRATE_ROOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("mainnet")),
            skip_completed: std::env::var("MIGRATE_SKIP_COMPLETED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }
}

/// Full configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Hosting service settings; absent for commands that stay local
    pub stream: Option<StreamConfig>,
    pub scan: ScanConfig,
    pub queue: QueueConfig,
    pub worker: WorkerConfig,
}

impl MigrationConfig {
    /// Load every section from the environment.
    ///
    /// The hosting credentials are only read when `with_stream` is set;
    /// when they are, missing credentials are a configuration error.
    pub fn from_env(with_stream: bool) -> WorkerResult<Self> {
        let stream = if with_stream {
            Some(StreamConfig::from_env().map_err(|e| WorkerError::config_error(e.to_string()))?)
        } else {
            None
        };
        let scan = ScanConfig::from_env();
        let mut worker = WorkerConfig::from_env();
        worker.root_dir = scan.root_dir.clone();

        Ok(Self {
            stream,
            scan,
            queue: QueueConfig::from_env(),
            worker,
        })
    }

    /// Hosting service settings, required by commands that upload.
    pub fn stream(&self) -> WorkerResult<&StreamConfig> {
        self.stream
            .as_ref()
            .ok_or_else(|| WorkerError::config_error("stream settings were not loaded"))
    }
}
