//! Bunny Stream HTTP client.
//!
//! One `reqwest::Client` is built from the config at startup and reused for
//! every call, so credentials and connection pools are resolved once.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use tracing::{debug, info_span, Instrument};

use smig_models::RemoteVideoId;

use crate::error::{StreamError, StreamResult};
use crate::host::VideoHost;
use crate::metrics::{record_request, record_upload_bytes};
use crate::types::{CreateVideoRequest, Video};

/// Default Bunny Stream API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://video.bunnycdn.com";

const ACCESS_KEY_HEADER: &str = "AccessKey";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the stream client.
#[derive(Clone)]
pub struct StreamConfig {
    /// Video library id
    pub library_id: String,
    /// Library API access key
    pub access_key: String,
    /// API base URL
    pub base_url: String,
    /// Per-request timeout (covers the whole upload body)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("library_id", &self.library_id)
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl StreamConfig {
    /// Create a config with default endpoint and timeouts.
    pub fn new(library_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            access_key: access_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables.
    ///
    /// `LIBRARYIDPROD` and `ACCESSKEYPROD` are required and must be non-empty.
    pub fn from_env() -> StreamResult<Self> {
        let library_id = required_env("LIBRARYIDPROD")?;
        let access_key = required_env("ACCESSKEYPROD")?;

        let timeout_secs: u64 = std::env::var("STREAM_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);
        let connect_timeout_secs: u64 = std::env::var("STREAM_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            library_id,
            access_key,
            base_url: std::env::var("STREAM_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

fn required_env(name: &str) -> StreamResult<String> {
    let value = std::env::var(name)
        .map_err(|_| StreamError::config_error(format!("{} not set", name)))?;
    if value.trim().is_empty() {
        return Err(StreamError::config_error(format!("{} cannot be empty", name)));
    }
    Ok(value)
}

// =============================================================================
// Client
// =============================================================================

/// Bunny Stream client.
#[derive(Clone)]
pub struct StreamClient {
    http: Client,
    config: StreamConfig,
    videos_url: String,
}

impl StreamClient {
    /// Create a new stream client.
    pub fn new(config: StreamConfig) -> StreamResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("smig-stream/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StreamError::Network)?;

        let videos_url = format!(
            "{}/library/{}/videos",
            config.base_url.trim_end_matches('/'),
            config.library_id
        );

        Ok(Self {
            http,
            config,
            videos_url,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn video_url(&self, remote_id: &RemoteVideoId) -> String {
        format!("{}/{}", self.videos_url, remote_id)
    }

    async fn error_from_response(operation: &'static str, response: Response) -> StreamError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StreamError::status(operation, status, body)
    }
}

#[async_trait]
impl VideoHost for StreamClient {
    async fn create_video(&self, title: &str) -> StreamResult<RemoteVideoId> {
        let body = serde_json::to_vec(&CreateVideoRequest {
            title: title.to_string(),
        })?;

        async {
            let start = Instant::now();
            let result = self
                .http
                .post(&self.videos_url)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/*+json")
                .header(ACCESS_KEY_HEADER, &self.config.access_key)
                .body(body)
                .send()
                .await;
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    record_request("create_video", 0, latency_ms);
                    return Err(StreamError::Network(e));
                }
            };
            record_request("create_video", response.status().as_u16(), latency_ms);

            if !response.status().is_success() {
                return Err(Self::error_from_response("create_video", response).await);
            }

            let body = response.bytes().await?;
            let video: Video = serde_json::from_slice(&body).map_err(|e| {
                StreamError::invalid_response(format!("create video response: {}", e))
            })?;
            let guid = video.guid().ok_or_else(|| {
                StreamError::invalid_response("create video response has no guid")
            })?;

            debug!(guid = %guid, library_id = ?video.video_library_id, "Created remote video");
            Ok(RemoteVideoId::from(guid))
        }
        .instrument(info_span!("create_video", title = %title))
        .await
    }

    async fn upload_video(&self, remote_id: &RemoteVideoId, bytes: Vec<u8>) -> StreamResult<()> {
        let url = self.video_url(remote_id);
        let size = bytes.len();

        async {
            let start = Instant::now();
            let result = self
                .http
                .put(&url)
                .header(ACCEPT, "application/json")
                .header(ACCESS_KEY_HEADER, &self.config.access_key)
                .body(bytes)
                .send()
                .await;
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    record_request("upload_video", 0, latency_ms);
                    return Err(StreamError::Network(e));
                }
            };
            record_request("upload_video", response.status().as_u16(), latency_ms);

            if !response.status().is_success() {
                return Err(Self::error_from_response("upload_video", response).await);
            }

            record_upload_bytes(size);
            debug!(bytes = size, latency_ms, "Uploaded video content");
            Ok(())
        }
        .instrument(info_span!("upload_video", guid = %remote_id))
        .await
    }
}
