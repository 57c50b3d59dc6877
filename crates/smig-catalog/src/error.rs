//! Catalog error types.

use std::path::PathBuf;

use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while scanning. All of them abort the scan.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Scan root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),

    #[error("Unsupported file name (expected <name>.<ext>): {0}")]
    UnsupportedFileName(PathBuf),

    #[error("Invalid entry {path}: {source}")]
    InvalidField {
        path: PathBuf,
        #[source]
        source: smig_models::ModelError,
    },

    #[error("Failed to check whether {path} exists: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rename target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("Token {0} was generated twice")]
    DuplicateToken(String),

    #[error("Failed to rename {from} to {to} after {renamed} successful renames: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        renamed: usize,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub fn read_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadDir {
            path: path.into(),
            source,
        }
    }

    pub fn inspect(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Inspect {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_field(path: impl Into<PathBuf>, source: smig_models::ModelError) -> Self {
        Self::InvalidField {
            path: path.into(),
            source,
        }
    }
}
