//! Stream client error types.

use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur while talking to the hosting service.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Failed to configure stream client: {0}")]
    ConfigError(String),

    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            operation,
            status,
            body: body.into(),
        }
    }

    /// HTTP status returned by the service, if the error carries one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StreamError::Status { status, .. } => Some(*status),
            StreamError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True if the request never got a response in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StreamError::Network(e) if e.is_timeout())
    }
}
