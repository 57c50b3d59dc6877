//! Video migration worker.
//!
//! This crate provides:
//! - Configuration resolved once from the environment
//! - Bounded worker pool with per-task timeout and failure isolation
//! - Completion records and the completion latch
//! - The two-phase migration driver used by the `smig` binary

pub mod command;
pub mod config;
pub mod error;
pub mod latch;
pub mod logging;
pub mod metrics;
pub mod migration;
pub mod pool;
pub mod recorder;

pub use command::{Cli, Command};
pub use config::{MigrationConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use latch::{CompletionLatch, LatchGuard};
pub use logging::TaskLogger;
pub use migration::Migration;
pub use pool::{FailedTask, RunSummary, WorkerPool};
pub use recorder::CompletionRecorder;
