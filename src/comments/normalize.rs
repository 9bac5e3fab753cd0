use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    comments::{
        CommentAuthor, CommentLocation, CommentMetadata, NormalizedComment, PreparedComment,
        StatusCategory, ThreadInfo,
    },
    format::{format_age, format_date, parse_timestamp, truncate_text, whole_days_between},
};

pub const PREVIEW_LEN: usize = 100;

/// Turns fetched comments into the dashboard model.
///
/// Pass one derives every per-comment field on its own; pass two indexes
/// replies by parent over the whole result and fills in thread info. Ages are
/// measured against `now` once and never refreshed.
pub fn normalize_comments(
    prepared: &[PreparedComment],
    now: DateTime<Utc>,
) -> Vec<NormalizedComment> {
    let mut normalized: Vec<NormalizedComment> = prepared
        .iter()
        .map(|comment| normalize_one(comment, now))
        .collect();

    let mut threads: HashMap<String, usize> = HashMap::new();
    for comment in &normalized {
        if let Some(parent_id) = &comment.parent_id {
            *threads.entry(parent_id.clone()).or_default() += 1;
        }
    }

    for comment in &mut normalized {
        let reply_count = threads.get(&comment.id).copied().unwrap_or(0);
        comment.thread = ThreadInfo {
            reply_count,
            has_replies: reply_count > 0,
        };
    }

    normalized
}

/// Status label and category for a comment of the given age.
pub fn classify(resolved: bool, age_days: i64) -> (String, StatusCategory) {
    if resolved {
        return ("Resolved".to_string(), StatusCategory::Resolved);
    }
    match age_days {
        0 => ("Today".to_string(), StatusCategory::Recent),
        1 => ("Yesterday".to_string(), StatusCategory::Recent),
        d if d < 7 => (format!("{} days ago", d), StatusCategory::Recent),
        _ => ("Active".to_string(), StatusCategory::Active),
    }
}

fn normalize_one(comment: &PreparedComment, now: DateTime<Utc>) -> NormalizedComment {
    let created = parse_timestamp(&comment.created_at);
    let resolved_ts = comment.resolved_at.as_deref().and_then(parse_timestamp);

    // a creation time in the future is a clock anomaly, not a negative age
    let age_days = created
        .map(|ts| whole_days_between(ts, now).max(0))
        .unwrap_or(0);
    let days_to_resolve = match (created, resolved_ts) {
        (Some(created), Some(resolved)) => Some(whole_days_between(created, resolved)),
        _ => None,
    };

    let (status_label, status_category) = classify(comment.resolved, age_days);

    let parent_id = comment.parent_id.clone().filter(|id| !id.is_empty());
    let author = CommentAuthor {
        id: comment.author.id.clone().filter(|id| !id.is_empty()),
        name: if comment.author.name.is_empty() {
            "Unknown".to_string()
        } else {
            comment.author.name.clone()
        },
        avatar: comment.author.avatar.clone().filter(|url| !url.is_empty()),
    };

    let location = CommentLocation {
        page_id: comment.page.as_ref().map(|p| p.id.clone()),
        page_name: comment.page.as_ref().map(|p| p.name.clone()),
        node_id: comment.node_id.clone().filter(|id| !id.is_empty()),
        node_name: comment.node.as_ref().map(|n| n.name.clone()),
        node_type: comment.node.as_ref().map(|n| n.kind.clone()),
        display: location_display(comment),
    };

    let metadata = CommentMetadata {
        has_location: comment.page.is_some() || comment.node.is_some(),
        has_node: comment.node.is_some(),
        is_recent: age_days < 7,
        is_old: age_days > 30,
        is_urgent: !comment.resolved && age_days > 7,
        author_id: author.id.clone(),
        page_id: location.page_id.clone(),
        node_type: location.node_type.clone(),
    };

    NormalizedComment {
        id: comment.id.clone(),
        is_reply: parent_id.is_some(),
        parent_id,
        author,
        message: comment.message.clone(),
        message_preview: truncate_text(&comment.message, PREVIEW_LEN),
        resolved: comment.resolved,
        status_label,
        status_category,
        created_at: comment.created_at.clone(),
        created_at_formatted: created
            .map(|ts| format_date(ts, now))
            .unwrap_or_else(|| "Invalid date".to_string()),
        resolved_at: comment.resolved_at.clone(),
        resolved_at_formatted: resolved_ts.map(|ts| format_date(ts, now)),
        created_timestamp: created.map(|ts| ts.timestamp_millis()),
        resolved_timestamp: resolved_ts.map(|ts| ts.timestamp_millis()),
        age_days,
        age_days_formatted: format_age(age_days),
        days_to_resolve,
        days_to_resolve_formatted: days_to_resolve.map(format_age),
        location,
        node_offset: comment.node_offset,
        metadata,
        thread: ThreadInfo::default(),
    }
}

fn location_display(comment: &PreparedComment) -> String {
    match (&comment.page, &comment.node) {
        (Some(page), Some(node)) => format!("{} > {}", page.name, node.name),
        (Some(page), None) => page.name.clone(),
        (None, Some(node)) => node.name.clone(),
        (None, None) => "File".to_string(),
    }
}
