//! Migration task and its queue row encoding.
//!
//! A row is `owner,token,extension` while queued and
//! `owner,token,extension,remote_id` once completed. Fields are never quoted,
//! so none of them may contain the delimiter or a line break.

use std::path::{Path, PathBuf};

use crate::error::{ModelError, ModelResult};
use crate::ids::{RemoteVideoId, Token};

/// Field separator used by queue rows and completion records.
pub const ROW_DELIMITER: char = ',';

/// Number of fields in a queued row.
pub const QUEUE_ROW_ARITY: usize = 3;

/// Number of fields in a completed row.
pub const COMPLETED_ROW_ARITY: usize = 4;

/// Check that a value can be stored as a row field.
pub fn validate_field(field: &'static str, value: &str) -> ModelResult<()> {
    if value.is_empty() {
        return Err(ModelError::empty(field));
    }
    if value.contains(|c: char| c == ROW_DELIMITER || c == '\n' || c == '\r') {
        return Err(ModelError::reserved(field, value));
    }
    Ok(())
}

/// One file's unit of migration work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Owner, taken from the file's parent directory name
    pub owner: String,
    /// Token assigned at scan time
    pub token: Token,
    /// Extension of the original file name (everything after the first dot)
    pub extension: String,
    /// Remote video id, present once the remote resource has been created
    pub remote_id: Option<RemoteVideoId>,
}

impl Task {
    /// Create a queued task, validating every field.
    pub fn new(
        owner: impl Into<String>,
        token: Token,
        extension: impl Into<String>,
    ) -> ModelResult<Self> {
        let owner = owner.into();
        let extension = extension.into();

        validate_field("owner", &owner)?;
        validate_field("token", token.as_str())?;
        validate_field("extension", &extension)?;

        Ok(Self {
            owner,
            token,
            extension,
            remote_id: None,
        })
    }

    /// Parse a queued (3 fields) or completed (4 fields) row.
    pub fn from_row(row: &str) -> ModelResult<Self> {
        let row = row.trim_end_matches(['\r', '\n']);
        let parts: Vec<&str> = row.split(ROW_DELIMITER).collect();

        match parts.as_slice() {
            [owner, token, extension] => Self::new(*owner, Token::from(*token), *extension),
            [owner, token, extension, remote_id] => {
                validate_field("remote_id", remote_id)?;
                let task = Self::new(*owner, Token::from(*token), *extension)?;
                Ok(task.with_remote_id(RemoteVideoId::from(*remote_id)))
            }
            _ => Err(ModelError::Arity {
                expected: QUEUE_ROW_ARITY,
                found: parts.len(),
                row: row.to_string(),
            }),
        }
    }

    /// Attach the remote video id.
    pub fn with_remote_id(mut self, remote_id: RemoteVideoId) -> Self {
        self.remote_id = Some(remote_id);
        self
    }

    /// Encode as a queued row (without line terminator).
    pub fn to_row(&self) -> String {
        [self.owner.as_str(), self.token.as_str(), self.extension.as_str()]
            .join(&ROW_DELIMITER.to_string())
    }

    /// Encode as a completed row; fails if the remote id is not yet known.
    pub fn to_completed_row(&self) -> ModelResult<String> {
        let remote_id = self
            .remote_id
            .as_ref()
            .ok_or_else(|| ModelError::MissingRemoteId(self.token.to_string()))?;
        Ok(format!("{}{}{}", self.to_row(), ROW_DELIMITER, remote_id))
    }

    /// File name after renaming: `<token>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.token, self.extension)
    }

    /// Location of the renamed file under the scan root.
    pub fn source_path(&self, root: &Path) -> PathBuf {
        root.join(&self.owner).join(self.file_name())
    }

    /// Completion record file name: `<owner>_<token>.txt`.
    pub fn completion_file_name(&self) -> String {
        format!("{}_{}.txt", self.owner, self.token)
    }
}
