//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Field '{field}' is empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' contains a reserved character: {value:?}")]
    ReservedCharacter { field: &'static str, value: String },

    #[error("Expected {expected} fields but found {found} in row {row:?}")]
    Arity {
        expected: usize,
        found: usize,
        row: String,
    },

    #[error("Task {0} has no remote video id")]
    MissingRemoteId(String),
}

impl ModelError {
    pub fn empty(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    pub fn reserved(field: &'static str, value: impl Into<String>) -> Self {
        Self::ReservedCharacter {
            field,
            value: value.into(),
        }
    }
}
