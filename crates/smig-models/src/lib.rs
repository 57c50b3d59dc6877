//! Shared data models for the stream migration pipeline.
//!
//! This crate provides:
//! - Migration tasks and their queue row encoding
//! - Scan-time tokens and remote video identifiers
//! - Field validation shared by the scanner, queue, and workers

pub mod error;
pub mod ids;
pub mod task;

pub use error::{ModelError, ModelResult};
pub use ids::{RemoteVideoId, Token};
pub use task::{validate_field, Task, COMPLETED_ROW_ARITY, QUEUE_ROW_ARITY, ROW_DELIMITER};
