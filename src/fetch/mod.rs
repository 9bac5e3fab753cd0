use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

pub mod fake;
pub mod handler;

pub use fake::FakeCommentsSource;
pub use handler::{load_comments, prepare_comment};

pub const TOKEN_HEADER: &str = "X-Figma-Token";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Authentication failed. Please check your OAuth token.")]
    Unauthorized,
    #[error("Access forbidden. You may not have permission to view comments.")]
    Forbidden,
    #[error("File not found or comments endpoint unavailable.")]
    NotFound,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("Invalid response format from Figma API")]
    InvalidFormat,
    #[error("Failed to fetch comments: {0}")]
    Transport(String),
}

impl FetchError {
    /// Maps a non-success status onto the message shown to the user.
    pub fn from_status(status: u16, reason: &str) -> Self {
        match status {
            401 => FetchError::Unauthorized,
            403 => FetchError::Forbidden,
            404 => FetchError::NotFound,
            429 => FetchError::RateLimited,
            _ => FetchError::Status {
                status,
                reason: reason.to_string(),
            },
        }
    }
}

/// Where comment payloads come from. Returns the decoded JSON body of a
/// successful response; shape checks happen in the orchestrator.
#[async_trait]
pub trait CommentsSource: Send + Sync {
    async fn fetch_comments(
        &self,
        file_key: &str,
        token: &str,
    ) -> Result<serde_json::Value, FetchError>;
}

/// The comments REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpCommentsSource {
    client: Client,
    api_base: String,
}

impl HttpCommentsSource {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn comments_url(&self, file_key: &str) -> String {
        format!("{}/v1/files/{}/comments", self.api_base, file_key)
    }
}

#[async_trait]
impl CommentsSource for HttpCommentsSource {
    async fn fetch_comments(
        &self,
        file_key: &str,
        token: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(self.comments_url(file_key))
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("comments endpoint returned {}: {}", status, body);
            return Err(FetchError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|_| FetchError::InvalidFormat)
    }
}
