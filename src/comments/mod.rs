use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::document::NodeKind;

pub mod filter;
pub mod normalize;
pub mod summary;

/// One record as the comments API returns it. Every field is lenient: a null,
/// missing or oddly typed value degrades to empty instead of failing the
/// record, so a sparse record still makes it through to normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub user: Option<RawUser>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub resolved_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub client_meta: Option<ClientMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub img_url: Option<String>,
}

/// Where in the document the comment was pinned when it was written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientMeta {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub node_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub node_offset: Option<NodeOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeOffset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Strings pass through, numbers and booleans are stringified, anything else
/// is treated as absent.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// A nested object that does not fit its shape is treated as absent.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Page a comment's node lived on at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub name: String,
}

/// The node itself, as found in the live document at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
}

/// A raw comment after the fetch-time document lookup, ready to normalize.
#[derive(Debug, Clone, Default)]
pub struct PreparedComment {
    pub id: String,
    pub author: CommentAuthor,
    pub created_at: String,
    pub resolved: bool,
    pub resolved_at: Option<String>,
    pub message: String,
    pub parent_id: Option<String>,
    pub node_id: Option<String>,
    pub node_offset: Option<NodeOffset>,
    pub page: Option<PageRef>,
    pub node: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: Option<String>,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Resolved,
    Recent,
    Active,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Resolved => "resolved",
            StatusCategory::Recent => "recent",
            StatusCategory::Active => "active",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentLocation {
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub node_id: Option<String>,
    pub node_name: Option<String>,
    pub node_type: Option<NodeKind>,
    pub display: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentMetadata {
    pub has_location: bool,
    pub has_node: bool,
    pub is_recent: bool,
    pub is_old: bool,
    pub is_urgent: bool,
    pub author_id: Option<String>,
    pub page_id: Option<String>,
    pub node_type: Option<NodeKind>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub reply_count: usize,
    pub has_replies: bool,
}

/// The dashboard's view of a comment. `age_days` is a snapshot taken at
/// normalization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedComment {
    pub id: String,
    pub parent_id: Option<String>,
    pub is_reply: bool,
    pub author: CommentAuthor,
    pub message: String,
    pub message_preview: String,
    pub resolved: bool,
    pub status_label: String,
    pub status_category: StatusCategory,
    pub created_at: String,
    pub created_at_formatted: String,
    pub resolved_at: Option<String>,
    pub resolved_at_formatted: Option<String>,
    pub created_timestamp: Option<i64>,
    pub resolved_timestamp: Option<i64>,
    pub age_days: i64,
    pub age_days_formatted: String,
    pub days_to_resolve: Option<i64>,
    pub days_to_resolve_formatted: Option<String>,
    pub location: CommentLocation,
    pub node_offset: Option<NodeOffset>,
    pub metadata: CommentMetadata,
    pub thread: ThreadInfo,
}

/// Status predicate of a filter. `Resolved`/`Unresolved` test the resolved
/// flag; `Active`/`Recent` test the status category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Resolved,
    Unresolved,
    Active,
    Recent,
}

/// Age buckets overlap: a comment from today is also in `week` and `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeRange {
    Today,
    Week,
    Month,
    Older,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub status: Option<StatusFilter>,
    pub author: Option<String>,
    pub page: Option<String>,
    pub node_type: Option<NodeKind>,
    pub age_range: Option<AgeRange>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub all: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub replies: usize,
    pub top_level: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub resolved: usize,
    pub recent: usize,
}

/// Cumulative, not exclusive: `this_week` includes `today`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgeCounts {
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub older: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OldestUnresolved {
    pub id: String,
    pub age_days: i64,
    pub message_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorStats {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentSummary {
    pub totals: SummaryTotals,
    pub by_status: StatusCounts,
    pub by_age: AgeCounts,
    pub oldest_unresolved: Option<OldestUnresolved>,
    pub by_author: Vec<AuthorStats>,
    pub resolution_rate: i64,
    pub average_age_days: i64,
}
