use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    comments::{
        normalize::normalize_comments, CommentAuthor, NodeRef, NormalizedComment, PageRef,
        PreparedComment, RawComment,
    },
    document::{enclosing_page, DocumentTree},
    fetch::{CommentsSource, FetchError},
};

/// Fetches the file's comments, resolves each one against the live document
/// and normalizes the lot. A malformed payload fails the whole fetch; a
/// failed document lookup only drops that comment's location.
pub async fn load_comments<S, D>(
    source: &S,
    doc: &D,
    file_key: &str,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedComment>, FetchError>
where
    S: CommentsSource + ?Sized,
    D: DocumentTree + ?Sized,
{
    let payload = source.fetch_comments(file_key, token).await?;
    let raw = parse_payload(payload)?;

    let prepared: Vec<PreparedComment> = raw.iter().map(|c| prepare_comment(c, doc)).collect();
    let normalized = normalize_comments(&prepared, now);

    info!(file_key, count = normalized.len(), "comments loaded");
    Ok(normalized)
}

fn parse_payload(payload: Value) -> Result<Vec<RawComment>, FetchError> {
    let Value::Object(mut body) = payload else {
        return Err(FetchError::InvalidFormat);
    };
    let Some(Value::Array(items)) = body.remove("comments") else {
        return Err(FetchError::InvalidFormat);
    };

    // Field-level oddities are absorbed by RawComment; only a record that is
    // not an object at all fails the fetch.
    items
        .into_iter()
        .map(|item| {
            if !item.is_object() {
                warn!("comment record is not an object: {}", item);
                return Err(FetchError::InvalidFormat);
            }
            serde_json::from_value::<RawComment>(item).map_err(|e| {
                warn!("comment record rejected: {}", e);
                FetchError::InvalidFormat
            })
        })
        .collect()
}

/// Attaches page and node display info from the live document to a raw
/// comment.
pub fn prepare_comment<D: DocumentTree + ?Sized>(raw: &RawComment, doc: &D) -> PreparedComment {
    let node_id = raw
        .client_meta
        .as_ref()
        .and_then(|meta| meta.node_id.clone())
        .filter(|id| !id.is_empty());

    let mut page = None;
    let mut node = None;

    if let Some(id) = node_id.as_deref() {
        match doc.node(id) {
            Ok(Some(found)) => {
                page = enclosing_page(doc, &found).map(|p| PageRef {
                    id: p.id,
                    name: p.name,
                });
                node = Some(NodeRef {
                    name: if found.name.is_empty() {
                        "Unnamed".to_string()
                    } else {
                        found.name
                    },
                    id: found.id,
                    kind: found.kind,
                });
            }
            Ok(None) => {}
            Err(e) => warn!("could not find node for comment {}: {}", raw.id, e),
        }
    }

    let author = match &raw.user {
        Some(user) => CommentAuthor {
            id: user.id.clone(),
            name: [&user.handle, &user.name]
                .into_iter()
                .flatten()
                .find(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            avatar: user.img_url.clone(),
        },
        None => CommentAuthor {
            id: None,
            name: "Unknown".to_string(),
            avatar: None,
        },
    };

    let resolved_at = raw.resolved_at.clone().filter(|ts| !ts.is_empty());

    PreparedComment {
        id: raw.id.clone(),
        author,
        created_at: raw.created_at.clone(),
        resolved: resolved_at.is_some(),
        resolved_at,
        message: raw.message.clone().unwrap_or_default(),
        parent_id: raw.parent_id.clone().filter(|id| !id.is_empty()),
        node_offset: raw.client_meta.as_ref().and_then(|meta| meta.node_offset),
        node_id,
        page,
        node,
    }
}
