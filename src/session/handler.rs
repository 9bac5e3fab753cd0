use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    comments::{filter::apply_filters, summary::summarize, FilterSpec},
    document::DocumentTree,
    error::AppError,
    fetch::{load_comments, CommentsSource},
    navigation::{navigate_to_comment, NavigationResult},
    response::PluginMessage,
    session::{
        parse_request, NavigateToComment, PluginRequest, Resize, Session, SetToken, MAX_HEIGHT,
        MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH,
    },
};

impl<D: DocumentTree, S: CommentsSource> Session<D, S> {
    /// The message emitted once when the plugin starts.
    pub fn ready_message(&self) -> PluginMessage {
        PluginMessage::ready(self.file_key.clone())
    }

    /// Parses and handles one raw inbound message.
    pub async fn handle_message(&mut self, raw: &Value) -> Vec<PluginMessage> {
        match parse_request(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("rejected inbound message: {}", e.message());
                vec![e.into()]
            }
        }
    }

    pub async fn handle(&mut self, request: PluginRequest) -> Vec<PluginMessage> {
        self.handle_at(request, Utc::now()).await
    }

    /// Handles one request to completion, returning the outbound messages it
    /// produced in order. `now` anchors comment ages for a fetch.
    pub async fn handle_at(
        &mut self,
        request: PluginRequest,
        now: DateTime<Utc>,
    ) -> Vec<PluginMessage> {
        if self.window.closed {
            return vec![AppError::Closed.into()];
        }

        match request {
            PluginRequest::FetchComments => self.fetch_comments(now).await,
            PluginRequest::SetToken(payload) => vec![self.set_token(payload)],
            PluginRequest::ApplyFilters(filters) => vec![self.apply_filters(filters)],
            PluginRequest::NavigateToComment(payload) => vec![self.navigate(payload)],
            PluginRequest::Resize(size) => {
                self.resize(size);
                Vec::new()
            }
            PluginRequest::ClosePlugin => {
                info!("plugin closed");
                self.window.closed = true;
                Vec::new()
            }
        }
    }

    async fn fetch_comments(&mut self, now: DateTime<Utc>) -> Vec<PluginMessage> {
        let Some(token) = self.token.clone() else {
            return vec![AppError::AuthRequired.into()];
        };
        let Some(file_key) = self.file_key.clone() else {
            return vec![AppError::MissingFileKey.into()];
        };

        let mut out = vec![PluginMessage::Fetching {
            message: "Fetching comments...".to_string(),
        }];

        match load_comments(&self.source, &self.document, &file_key, &token, now).await {
            Ok(comments) => {
                let summary = summarize(&comments);
                self.comments = comments;
                out.push(PluginMessage::comments_loaded(
                    self.comments.clone(),
                    summary,
                ));
            }
            Err(e) => {
                error!("Error fetching comments: {}", e);
                out.push(AppError::from(e).into());
            }
        }
        out
    }

    fn set_token(&mut self, payload: SetToken) -> PluginMessage {
        self.token = Some(payload.token);
        info!("auth token set");
        PluginMessage::TokenSet {
            message: "Token set successfully".to_string(),
        }
    }

    fn apply_filters(&mut self, filters: FilterSpec) -> PluginMessage {
        self.filters = filters;
        let filtered = apply_filters(&self.comments, &self.filters);
        PluginMessage::filtered(filtered, self.filters.clone())
    }

    fn navigate(&mut self, payload: NavigateToComment) -> PluginMessage {
        let comment_id = payload.comment_id;
        let result = match self.comments.iter().find(|c| c.id == comment_id) {
            Some(comment) => navigate_to_comment(&mut self.document, &comment_id, comment),
            None => NavigationResult::failure("Comment not found"),
        };
        if !result.success {
            warn!(comment_id = %comment_id, "navigation failed: {}", result.message);
        }
        PluginMessage::NavigationComplete { comment_id, result }
    }

    fn resize(&mut self, size: Resize) {
        let (Some(width), Some(height)) = (size.width, size.height) else {
            return;
        };
        if width == 0.0 || height == 0.0 {
            return;
        }
        self.window.width = width.clamp(MIN_WIDTH, MAX_WIDTH).round() as u32;
        self.window.height = height.clamp(MIN_HEIGHT, MAX_HEIGHT).round() as u32;
    }
}
