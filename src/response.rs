use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    comments::{CommentSummary, FilterSpec, NormalizedComment},
    navigation::NavigationResult,
};

pub const READY_MESSAGE: &str = "Plugin initialized. Configure OAuth token to fetch comments.";

/// A message sent from the plugin to the UI panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PluginMessage {
    PluginReady {
        message: String,
        #[serde(rename = "fileKey")]
        file_key: Option<String>,
    },
    TokenSet {
        message: String,
    },
    Fetching {
        message: String,
    },
    CommentsLoaded {
        comments: Vec<NormalizedComment>,
        summary: CommentSummary,
        count: usize,
        message: String,
    },
    FilteredComments {
        comments: Vec<NormalizedComment>,
        count: usize,
        filters_applied: FilterSpec,
    },
    NavigationComplete {
        comment_id: String,
        #[serde(flatten)]
        result: NavigationResult,
    },
    Error {
        message: String,
        #[serde(rename = "requiresAuth", skip_serializing_if = "std::ops::Not::not")]
        requires_auth: bool,
    },
}

impl PluginMessage {
    pub fn ready(file_key: Option<String>) -> Self {
        PluginMessage::PluginReady {
            message: READY_MESSAGE.to_string(),
            file_key,
        }
    }

    pub fn comments_loaded(comments: Vec<NormalizedComment>, summary: CommentSummary) -> Self {
        let count = comments.len();
        PluginMessage::CommentsLoaded {
            comments,
            summary,
            count,
            message: format!("Successfully loaded {} comment(s)", count),
        }
    }

    pub fn filtered(comments: Vec<NormalizedComment>, filters_applied: FilterSpec) -> Self {
        PluginMessage::FilteredComments {
            count: comments.len(),
            comments,
            filters_applied,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PluginMessage::Error {
            message: message.into(),
            requires_auth: false,
        }
    }

    /// The `type` discriminator this message serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            PluginMessage::PluginReady { .. } => "plugin-ready",
            PluginMessage::TokenSet { .. } => "token-set",
            PluginMessage::Fetching { .. } => "fetching",
            PluginMessage::CommentsLoaded { .. } => "comments-loaded",
            PluginMessage::FilteredComments { .. } => "filtered-comments",
            PluginMessage::NavigationComplete { .. } => "navigation-complete",
            PluginMessage::Error { .. } => "error",
        }
    }
}

/// Envelope the bridge returns: every outbound message one inbound request
/// produced, in emission order.
#[derive(Debug, Serialize)]
pub struct BridgeResponse {
    pub messages: Vec<PluginMessage>,
}

impl BridgeResponse {
    pub fn new(messages: Vec<PluginMessage>) -> Self {
        Self { messages }
    }

    /// Usage: `BridgeResponse::new(msgs).with_status(StatusCode::GONE)`
    pub fn with_status(self, status: StatusCode) -> BridgeResponseWithStatus {
        BridgeResponseWithStatus {
            status,
            response: self,
        }
    }
}

/// A BridgeResponse paired with a non-200 status code.
pub struct BridgeResponseWithStatus {
    status: StatusCode,
    response: BridgeResponse,
}

impl IntoResponse for BridgeResponseWithStatus {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl IntoResponse for BridgeResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
