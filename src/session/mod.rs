use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    comments::{AgeRange, FilterSpec, NormalizedComment, StatusFilter},
    document::DocumentTree,
    error::AppError,
    fetch::CommentsSource,
};

pub mod handler;

pub const MIN_WIDTH: f64 = 300.0;
pub const MAX_WIDTH: f64 = 800.0;
pub const MIN_HEIGHT: f64 = 400.0;
pub const MAX_HEIGHT: f64 = 1000.0;

/// An inbound message from the UI panel, already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginRequest {
    FetchComments,
    SetToken(SetToken),
    ApplyFilters(FilterSpec),
    NavigateToComment(NavigateToComment),
    Resize(Resize),
    ClosePlugin,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct SetToken {
    #[validate(length(min = 1, message = "Invalid token format"))]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct NavigateToComment {
    #[validate(length(min = 1, message = "Invalid comment ID"))]
    pub comment_id: String,
}

/// Requested panel size. Any non-zero pair is clamped into range; a missing
/// or zero dimension leaves the window alone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Resize {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Filter fields as the UI sends them: any subset, empty strings meaning unset.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    pub status: Option<String>,
    pub author: Option<String>,
    pub page: Option<String>,
    pub node_type: Option<String>,
    pub age_range: Option<String>,
    pub search: Option<String>,
}

impl TryFrom<FilterRequest> for FilterSpec {
    type Error = AppError;

    fn try_from(req: FilterRequest) -> Result<Self, Self::Error> {
        let status = non_empty(req.status)
            .map(|s| match s.as_str() {
                "resolved" => Ok(StatusFilter::Resolved),
                "unresolved" => Ok(StatusFilter::Unresolved),
                "active" => Ok(StatusFilter::Active),
                "recent" => Ok(StatusFilter::Recent),
                _ => Err(invalid_filters()),
            })
            .transpose()?;
        let age_range = non_empty(req.age_range)
            .map(|s| match s.as_str() {
                "today" => Ok(AgeRange::Today),
                "week" => Ok(AgeRange::Week),
                "month" => Ok(AgeRange::Month),
                "older" => Ok(AgeRange::Older),
                _ => Err(invalid_filters()),
            })
            .transpose()?;

        Ok(FilterSpec {
            status,
            author: non_empty(req.author),
            page: non_empty(req.page),
            node_type: non_empty(req.node_type).map(Into::into),
            age_range,
            search: non_empty(req.search),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn invalid_filters() -> AppError {
    AppError::BadRequest("Invalid filters format".to_string())
}

/// Parses one inbound message by its `type` discriminator.
pub fn parse_request(raw: &Value) -> Result<PluginRequest, AppError> {
    let kind = match raw.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(other) => return Err(AppError::UnknownMessage(other.to_string())),
        None => return Err(AppError::UnknownMessage("undefined".to_string())),
    };

    match kind {
        "fetch-comments" => Ok(PluginRequest::FetchComments),
        "set-token" => {
            let payload: SetToken = validated(raw, "Invalid token format")?;
            Ok(PluginRequest::SetToken(payload))
        }
        "apply-filters" => {
            let filters = raw
                .get("filters")
                .filter(|f| f.is_object())
                .ok_or_else(invalid_filters)?;
            let req: FilterRequest =
                serde_json::from_value(filters.clone()).map_err(|_| invalid_filters())?;
            Ok(PluginRequest::ApplyFilters(req.try_into()?))
        }
        "navigate-to-comment" => {
            let payload: NavigateToComment = validated(raw, "Invalid comment ID")?;
            Ok(PluginRequest::NavigateToComment(payload))
        }
        // Non-numeric dimensions are dropped silently rather than reported.
        "resize" => {
            let payload = serde_json::from_value::<Resize>(raw.clone()).unwrap_or_default();
            Ok(PluginRequest::Resize(payload))
        }
        "close-plugin" => Ok(PluginRequest::ClosePlugin),
        other => Err(AppError::UnknownMessage(other.to_string())),
    }
}

fn validated<T>(raw: &Value, message: &str) -> Result<T, AppError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let payload: T =
        serde_json::from_value(raw.clone()).map_err(|_| AppError::BadRequest(message.to_string()))?;
    payload
        .validate()
        .map_err(|_| AppError::BadRequest(message.to_string()))?;
    Ok(payload)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowState {
    pub width: u32,
    pub height: u32,
    pub closed: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
            closed: false,
        }
    }
}

/// All mutable plugin state for one open file: the loaded comments, the
/// active filter, the auth token and the panel window.
pub struct Session<D, S> {
    document: D,
    source: S,
    file_key: Option<String>,
    token: Option<String>,
    comments: Vec<NormalizedComment>,
    filters: FilterSpec,
    window: WindowState,
}

impl<D: DocumentTree, S: CommentsSource> Session<D, S> {
    pub fn new(document: D, source: S, file_key: Option<String>) -> Self {
        Self {
            document,
            source,
            file_key: file_key.filter(|k| !k.is_empty()),
            token: None,
            comments: Vec::new(),
            filters: FilterSpec::default(),
            window: WindowState::default(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn file_key(&self) -> Option<&str> {
        self.file_key.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn comments(&self) -> &[NormalizedComment] {
        &self.comments
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn window(&self) -> WindowState {
        self.window
    }

    pub fn is_closed(&self) -> bool {
        self.window.closed
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// The live document, for edits made outside the plugin.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
