use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    fetch::FetchError,
    response::{BridgeResponse, PluginMessage},
};

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    BadRequest(String),
    AuthRequired,
    MissingFileKey,
    UnknownMessage(String),
    Closed,
    Fetch(FetchError),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::AuthRequired => {
                "OAuth token not set. Please configure authentication.".to_string()
            }
            AppError::MissingFileKey => {
                "File key is unavailable. Make sure you are in a valid Figma file.".to_string()
            }
            AppError::UnknownMessage(kind) => format!("Unknown message type: {}", kind),
            AppError::Closed => "Plugin is closed".to_string(),
            AppError::Fetch(e) => e.to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, AppError::AuthRequired)
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Fetch(e)
    }
}

impl From<AppError> for PluginMessage {
    fn from(e: AppError) -> Self {
        PluginMessage::Error {
            message: e.message(),
            requires_auth: e.requires_auth(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) | AppError::UnknownMessage(_) => StatusCode::BAD_REQUEST,
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::MissingFileKey => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Closed => StatusCode::GONE,
            AppError::Fetch(FetchError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };

        // Same envelope as a successful exchange, carrying the one error message
        BridgeResponse::new(vec![self.into()])
            .with_status(status)
            .into_response()
    }
}
