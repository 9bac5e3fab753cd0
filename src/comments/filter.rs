use crate::comments::{AgeRange, FilterSpec, NormalizedComment, StatusCategory, StatusFilter};

/// Returns the comments matching every active predicate of `spec`, in their
/// original order. Unset predicates are skipped.
pub fn apply_filters(comments: &[NormalizedComment], spec: &FilterSpec) -> Vec<NormalizedComment> {
    let search = spec
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    comments
        .iter()
        .filter(|c| spec.status.map_or(true, |status| matches_status(c, status)))
        .filter(|c| {
            spec.author
                .as_deref()
                .map_or(true, |author| c.author.id.as_deref() == Some(author))
        })
        .filter(|c| {
            spec.page
                .as_deref()
                .map_or(true, |page| c.location.page_id.as_deref() == Some(page))
        })
        .filter(|c| {
            spec.node_type
                .as_ref()
                .map_or(true, |kind| c.location.node_type.as_ref() == Some(kind))
        })
        .filter(|c| spec.age_range.map_or(true, |range| matches_age(c.age_days, range)))
        .filter(|c| search.as_deref().map_or(true, |needle| matches_search(c, needle)))
        .cloned()
        .collect()
}

fn matches_status(comment: &NormalizedComment, status: StatusFilter) -> bool {
    match status {
        StatusFilter::Resolved => comment.resolved,
        StatusFilter::Unresolved => !comment.resolved,
        StatusFilter::Active => comment.status_category == StatusCategory::Active,
        StatusFilter::Recent => comment.status_category == StatusCategory::Recent,
    }
}

pub(crate) fn matches_age(age_days: i64, range: AgeRange) -> bool {
    match range {
        AgeRange::Today => age_days == 0,
        AgeRange::Week => age_days < 7,
        AgeRange::Month => age_days < 30,
        AgeRange::Older => age_days >= 30,
    }
}

/// `needle` must already be trimmed and lowercased.
fn matches_search(comment: &NormalizedComment, needle: &str) -> bool {
    comment.message.to_lowercase().contains(needle)
        || comment.author.name.to_lowercase().contains(needle)
        || comment.location.display.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::normalize::normalize_comments;
    use crate::comments::{CommentAuthor, NodeRef, PageRef, PreparedComment};
    use crate::document::NodeKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn comment(id: &str, author: &str, age: i64, resolved: bool) -> PreparedComment {
        PreparedComment {
            id: id.to_string(),
            author: CommentAuthor {
                id: Some(author.to_string()),
                name: author.to_uppercase(),
                avatar: None,
            },
            created_at: (now() - Duration::days(age) - Duration::minutes(1)).to_rfc3339(),
            resolved,
            resolved_at: resolved.then(|| now().to_rfc3339()),
            message: format!("Please fix the {} spacing", id),
            ..Default::default()
        }
    }

    fn on_node(mut c: PreparedComment, page: &str, node: &str, kind: NodeKind) -> PreparedComment {
        c.page = Some(PageRef {
            id: format!("page-{}", page),
            name: page.to_string(),
        });
        c.node = Some(NodeRef {
            id: format!("node-{}", node),
            name: node.to_string(),
            kind,
        });
        c.node_id = Some(format!("node-{}", node));
        c
    }

    fn fixture() -> Vec<NormalizedComment> {
        normalize_comments(
            &[
                on_node(comment("header", "ada", 0, false), "Home", "Header", NodeKind::Frame),
                on_node(comment("button", "bob", 3, true), "Home", "CTA", NodeKind::Instance),
                on_node(comment("footer", "ada", 12, false), "About", "Footer", NodeKind::Text),
                comment("palette", "cy", 45, false),
            ],
            now(),
        )
    }

    fn ids(comments: &[NormalizedComment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_empty_spec_returns_everything() {
        let all = fixture();
        assert_eq!(apply_filters(&all, &FilterSpec::default()), all);
    }

    #[test]
    fn test_status_modes() {
        let all = fixture();
        let with = |status| FilterSpec {
            status: Some(status),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &with(StatusFilter::Resolved))), ["button"]);
        assert_eq!(
            ids(&apply_filters(&all, &with(StatusFilter::Unresolved))),
            ["header", "footer", "palette"]
        );
        assert_eq!(ids(&apply_filters(&all, &with(StatusFilter::Recent))), ["header"]);
        assert_eq!(
            ids(&apply_filters(&all, &with(StatusFilter::Active))),
            ["footer", "palette"]
        );
    }

    #[test]
    fn test_author_page_and_node_type() {
        let all = fixture();

        let by_author = FilterSpec {
            author: Some("ada".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &by_author)), ["header", "footer"]);

        let by_page = FilterSpec {
            page: Some("page-Home".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &by_page)), ["header", "button"]);

        let by_type = FilterSpec {
            node_type: Some(NodeKind::Text),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &by_type)), ["footer"]);
    }

    #[test]
    fn test_age_ranges_overlap() {
        let all = fixture();
        let with = |range| FilterSpec {
            age_range: Some(range),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &with(AgeRange::Today))), ["header"]);
        assert_eq!(ids(&apply_filters(&all, &with(AgeRange::Week))), ["header", "button"]);
        assert_eq!(
            ids(&apply_filters(&all, &with(AgeRange::Month))),
            ["header", "button", "footer"]
        );
        assert_eq!(ids(&apply_filters(&all, &with(AgeRange::Older))), ["palette"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_trimmed() {
        let all = fixture();
        let search = |q: &str| FilterSpec {
            search: Some(q.to_string()),
            ..Default::default()
        };

        // message
        assert_eq!(ids(&apply_filters(&all, &search("  FOOTER "))), ["footer"]);
        // author name
        assert_eq!(ids(&apply_filters(&all, &search("bob"))), ["button"]);
        // location display
        assert_eq!(ids(&apply_filters(&all, &search("about >"))), ["footer"]);
        assert_eq!(ids(&apply_filters(&all, &search("file"))), ["palette"]);
        // blank query filters nothing
        assert_eq!(apply_filters(&all, &search("   ")).len(), all.len());
    }

    #[test]
    fn test_predicates_intersect() {
        let all = fixture();
        let spec = FilterSpec {
            status: Some(StatusFilter::Unresolved),
            author: Some("ada".to_string()),
            age_range: Some(AgeRange::Week),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&all, &spec)), ["header"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let all = fixture();
        let spec = FilterSpec {
            author: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(apply_filters(&all, &spec).is_empty());
    }

    // ==================== Property-Based Tests ====================

    fn status_strategy() -> impl Strategy<Value = Option<StatusFilter>> {
        proptest::option::of(prop_oneof![
            Just(StatusFilter::Resolved),
            Just(StatusFilter::Unresolved),
            Just(StatusFilter::Active),
            Just(StatusFilter::Recent),
        ])
    }

    proptest! {
        #[test]
        fn prop_filter_steps_commute(
            status in status_strategy(),
            author in proptest::option::of(prop_oneof![Just("ada"), Just("bob"), Just("cy")]),
        ) {
            let all = fixture();
            let status_only = FilterSpec { status, ..Default::default() };
            let author_only = FilterSpec {
                author: author.map(str::to_string),
                ..Default::default()
            };
            let combined = FilterSpec {
                status,
                author: author.map(str::to_string),
                ..Default::default()
            };

            let status_then_author = apply_filters(&apply_filters(&all, &status_only), &author_only);
            let author_then_status = apply_filters(&apply_filters(&all, &author_only), &status_only);

            prop_assert_eq!(&status_then_author, &author_then_status);
            prop_assert_eq!(&status_then_author, &apply_filters(&all, &combined));
        }

        #[test]
        fn prop_result_is_ordered_subset(age in 0i64..100, status in status_strategy()) {
            let all = fixture();
            let spec = FilterSpec {
                status,
                age_range: Some(if age < 50 { AgeRange::Month } else { AgeRange::Older }),
                ..Default::default()
            };
            let out = apply_filters(&all, &spec);
            let positions: Vec<usize> = out
                .iter()
                .map(|c| all.iter().position(|a| a.id == c.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
