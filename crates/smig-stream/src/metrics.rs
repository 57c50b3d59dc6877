//! Stream client metrics.
//!
//! Provides standardized metrics for monitoring hosting service calls:
//! - Request counters by operation and status
//! - Latency histograms
//! - Uploaded byte counter

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total stream API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "smig_remote_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "smig_remote_latency_seconds";

    /// Total bytes sent in successful uploads.
    pub const UPLOAD_BYTES_TOTAL: &str = "smig_upload_bytes_total";
}

/// Record metrics for a completed stream API request.
///
/// `status` is 0 when no HTTP response was received.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record the size of a successful upload.
pub fn record_upload_bytes(bytes: usize) {
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes as u64);
}
