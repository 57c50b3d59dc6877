//! Hosting service seam.

use async_trait::async_trait;

use smig_models::RemoteVideoId;

use crate::error::StreamResult;

/// Remote video hosting operations needed by the migration.
///
/// Both calls hold the calling worker until the service answers.
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Create an empty video resource and return its remote id.
    async fn create_video(&self, title: &str) -> StreamResult<RemoteVideoId>;

    /// Upload the full content of an already created video in one request.
    async fn upload_video(&self, remote_id: &RemoteVideoId, bytes: Vec<u8>) -> StreamResult<()>;
}
