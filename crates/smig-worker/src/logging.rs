//! Structured task logging utilities.
//!
//! Every task log line carries the owner and token so a failure can be tied
//! back to its queue row and renamed file.

use tracing::{error, info, warn, Span};
use smig_models::Task;

/// Task logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    owner: String,
    token: String,
    operation: String,
}

impl TaskLogger {
    /// Create a logger for a parsed task.
    ///
    /// # Arguments
    /// * `task` - The task being processed
    /// * `operation` - The phase label (e.g. "upload")
    pub fn new(task: &Task, operation: &str) -> Self {
        Self {
            owner: task.owner.clone(),
            token: task.token.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create a logger for a row that has not been parsed (or failed to parse).
    pub fn from_row(row: &str, operation: &str) -> Self {
        let mut fields = row.splitn(3, smig_models::ROW_DELIMITER);
        Self {
            owner: fields.next().unwrap_or_default().to_string(),
            token: fields.next().unwrap_or_default().to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            owner = %self.owner,
            token = %self.token,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smig_models::Token;

    #[test]
    fn test_task_logger_creation() {
        let task = Task::new("alice", Token::from_string("tok-1"), "mp4").unwrap();
        let logger = TaskLogger::new(&task, "upload");

        assert_eq!(logger.owner(), "alice");
        assert_eq!(logger.token(), "tok-1");
        assert_eq!(logger.operation(), "upload");
    }

    #[test]
    fn test_task_logger_from_malformed_row() {
        let logger = TaskLogger::from_row("just-one-field", "upload");

        assert_eq!(logger.owner(), "just-one-field");
        assert_eq!(logger.token(), "");
    }
}
