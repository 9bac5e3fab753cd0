use std::collections::HashMap;

use crate::comments::{
    filter::matches_age, AgeCounts, AgeRange, AuthorStats, CommentSummary, NormalizedComment,
    OldestUnresolved, StatusCategory, StatusCounts, SummaryTotals,
};

const UNKNOWN_AUTHOR: &str = "unknown";

/// Dashboard statistics over the full comment set.
pub fn summarize(comments: &[NormalizedComment]) -> CommentSummary {
    let total = comments.len();
    let resolved = comments.iter().filter(|c| c.resolved).count();
    let replies = comments.iter().filter(|c| c.is_reply).count();

    let count_status = |category: StatusCategory| {
        comments
            .iter()
            .filter(|c| c.status_category == category)
            .count()
    };
    let count_age = |range: AgeRange| {
        comments
            .iter()
            .filter(|c| matches_age(c.age_days, range))
            .count()
    };

    // first-encountered wins ties
    let oldest_unresolved = comments
        .iter()
        .filter(|c| !c.resolved)
        .fold(None::<&NormalizedComment>, |oldest, current| match oldest {
            Some(o) if current.age_days <= o.age_days => Some(o),
            _ => Some(current),
        })
        .map(|c| OldestUnresolved {
            id: c.id.clone(),
            age_days: c.age_days,
            message_preview: c.message_preview.clone(),
        });

    let age_sum: i64 = comments.iter().map(|c| c.age_days).sum();

    CommentSummary {
        totals: SummaryTotals {
            all: total,
            resolved,
            unresolved: total - resolved,
            replies,
            top_level: total - replies,
        },
        by_status: StatusCounts {
            active: count_status(StatusCategory::Active),
            resolved: count_status(StatusCategory::Resolved),
            recent: count_status(StatusCategory::Recent),
        },
        by_age: AgeCounts {
            today: count_age(AgeRange::Today),
            this_week: count_age(AgeRange::Week),
            this_month: count_age(AgeRange::Month),
            older: count_age(AgeRange::Older),
        },
        oldest_unresolved,
        by_author: author_breakdown(comments),
        resolution_rate: rounded_ratio(resolved as i64 * 100, total),
        average_age_days: rounded_ratio(age_sum, total),
    }
}

fn author_breakdown(comments: &[NormalizedComment]) -> Vec<AuthorStats> {
    let mut stats: Vec<AuthorStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for comment in comments {
        let author_id = comment
            .author
            .id
            .clone()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let slot = *index.entry(author_id.clone()).or_insert_with(|| {
            stats.push(AuthorStats {
                id: author_id,
                name: comment.author.name.clone(),
                count: 0,
                resolved: 0,
                unresolved: 0,
            });
            stats.len() - 1
        });

        let entry = &mut stats[slot];
        entry.count += 1;
        if comment.resolved {
            entry.resolved += 1;
        } else {
            entry.unresolved += 1;
        }
    }

    stats
}

fn rounded_ratio(numerator: i64, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (numerator as f64 / total as f64).round() as i64
}
