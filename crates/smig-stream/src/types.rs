//! Stream API request/response types.

use serde::{Deserialize, Serialize};

/// Body of the create video request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
}

/// Video resource as returned by the service.
///
/// Only `guid` is required by the migration; the rest is kept for logging.
/// Every field is optional because the service sends `null` for values it
/// has not computed yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    pub video_library_id: Option<i64>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub date_uploaded: Option<String>,
    pub views: Option<i64>,
    pub is_public: Option<bool>,
    pub length: Option<i64>,
    pub status: Option<i64>,
    pub framerate: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub available_resolutions: Option<String>,
    pub thumbnail_count: Option<i64>,
    pub encode_progress: Option<i64>,
    pub storage_size: Option<i64>,
    #[serde(rename = "hasMP4Fallback")]
    pub has_mp4_fallback: Option<bool>,
    pub collection_id: Option<String>,
    pub thumbnail_file_name: Option<String>,
    pub category: Option<String>,
}

impl Video {
    /// The video guid, if present and non-blank.
    pub fn guid(&self) -> Option<&str> {
        self.guid
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }
}
