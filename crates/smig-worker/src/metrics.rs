//! Worker metrics.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Finished tasks by outcome (completed, failed, timeout, skipped).
    pub const TASKS_TOTAL: &str = "smig_tasks_total";
}

/// Task outcome labels.
pub mod outcome {
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const TIMEOUT: &str = "timeout";
    pub const SKIPPED: &str = "skipped";
}

/// Record one finished task.
pub fn record_task(outcome: &'static str) {
    counter!(names::TASKS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record several tasks sharing an outcome.
pub fn record_tasks(outcome: &'static str, count: usize) {
    if count > 0 {
        counter!(names::TASKS_TOTAL, "outcome" => outcome).increment(count as u64);
    }
}
