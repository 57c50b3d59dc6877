//! Bunny Stream REST API client.
//!
//! This crate provides:
//! - The `VideoHost` seam used by migration workers
//! - A reqwest-based client for creating videos and uploading their content
//! - Request metrics (counters and latency histograms)

pub mod client;
pub mod error;
pub mod host;
pub mod metrics;
pub mod types;

pub use client::{StreamClient, StreamConfig, DEFAULT_BASE_URL};
pub use error::{StreamError, StreamResult};
pub use host::VideoHost;
pub use types::{CreateVideoRequest, Video};
