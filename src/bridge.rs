use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use review_comments::{
    document::MemoryDocument,
    error::AppError,
    fetch::{CommentsSource, HttpCommentsSource},
    response::BridgeResponse,
    session::{Session, WindowState},
};

pub type SharedSession<S = HttpCommentsSource> = Arc<Mutex<Session<MemoryDocument, S>>>;

/// Plugin readiness message
/// GET /api/ready
pub async fn ready<S: CommentsSource + 'static>(
    State(session): State<SharedSession<S>>,
) -> BridgeResponse {
    let session = session.lock().await;
    BridgeResponse::new(vec![session.ready_message()])
}

/// Handle one inbound UI message
/// POST /api/messages
pub async fn post_message<S: CommentsSource + 'static>(
    State(session): State<SharedSession<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<BridgeResponse, AppError> {
    let Json(raw) = payload.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid message body: {}", rejection.body_text()))
    })?;
    if !raw.is_object() {
        return Err(AppError::BadRequest(
            "Inbound message must be a JSON object".to_string(),
        ));
    }

    // Held across the fetch so requests run one at a time
    let mut session = session.lock().await;
    if session.is_closed() {
        return Err(AppError::Closed);
    }

    let messages = session.handle_message(&raw).await;
    debug!("inbound {} produced {} message(s)", raw["type"], messages.len());
    Ok(BridgeResponse::new(messages))
}

/// Current panel window state
/// GET /api/window
pub async fn get_window<S: CommentsSource + 'static>(
    State(session): State<SharedSession<S>>,
) -> Json<WindowState> {
    Json(session.lock().await.window())
}
