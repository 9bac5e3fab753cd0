use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::fetch::{CommentsSource, FetchError};

/// In-process stand-in for the comments endpoint.
pub struct FakeCommentsSource {
    pub response: Mutex<Result<Value, FetchError>>,
    pub last_request: Mutex<Option<(String, String)>>,
    pub fetch_calls: AtomicU64,
}

impl FakeCommentsSource {
    pub fn with_comments(comments: Vec<Value>) -> Self {
        Self::with_body(json!({ "comments": comments }))
    }

    pub fn with_body(body: Value) -> Self {
        Self {
            response: Mutex::new(Ok(body)),
            last_request: Mutex::new(None),
            fetch_calls: AtomicU64::new(0),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            last_request: Mutex::new(None),
            fetch_calls: AtomicU64::new(0),
        }
    }

    pub async fn respond_with(&self, response: Result<Value, FetchError>) {
        *self.response.lock().await = response;
    }

    pub fn calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentsSource for FakeCommentsSource {
    async fn fetch_comments(&self, file_key: &str, token: &str) -> Result<Value, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some((file_key.to_string(), token.to_string()));
        self.response.lock().await.clone()
    }
}
