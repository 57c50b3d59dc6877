//! Durable task queue file.
//!
//! This crate provides:
//! - Persisting scanned tasks as one delimited row per line
//! - Loading the rows back as the authoritative task list
//!
//! The file is the checkpoint between the scan and execution phases: once it
//! is written, execution can be re-run from it without scanning again.

pub mod error;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use store::{QueueConfig, QueueStore, DEFAULT_QUEUE_FILE};
