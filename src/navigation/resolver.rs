use tracing::{debug, warn};

use crate::{
    comments::NormalizedComment,
    document::{enclosing_page, find_page_by_name, is_within, DocumentNode, DocumentTree},
    navigation::{NavigatedTo, NavigationResult, FILE_LEVEL_INFO, NODE_DELETED_WARNING},
};

/// Fallback chain for locating a comment in a document that may have drifted
/// since the comment was written.
#[derive(Debug)]
enum Step {
    TryNode(String),
    NodeMissingRecovery(String),
    TryPage(String),
    PageMissingRecovery,
    FileLevel,
    Done(NavigationResult),
}

/// Switches the document to the best surviving location for `comment` and
/// focuses it. Every failure comes back as an unsuccessful result.
pub fn navigate_to_comment<D: DocumentTree + ?Sized>(
    doc: &mut D,
    comment_id: &str,
    comment: &NormalizedComment,
) -> NavigationResult {
    if comment_id.trim().is_empty() {
        return NavigationResult::failure("Invalid comment ID");
    }

    let mut step = first_step(comment);
    loop {
        debug!(comment_id, ?step, "navigation step");
        step = match step {
            Step::TryNode(node_id) => try_node(doc, &node_id),
            Step::NodeMissingRecovery(node_id) => recover_missing_node(doc, &node_id, comment),
            Step::TryPage(page_id) => try_page(doc, &page_id),
            Step::PageMissingRecovery => recover_missing_page(doc, comment),
            Step::FileLevel => file_level(doc),
            Step::Done(result) => return result,
        };
    }
}

fn first_step(comment: &NormalizedComment) -> Step {
    let location = &comment.location;
    if let Some(node_id) = location.node_id.as_deref().filter(|id| !id.is_empty()) {
        return Step::TryNode(node_id.to_string());
    }
    if let Some(page_id) = location.page_id.as_deref().filter(|id| !id.is_empty()) {
        return Step::TryPage(page_id.to_string());
    }
    Step::FileLevel
}

fn try_node<D: DocumentTree + ?Sized>(doc: &mut D, node_id: &str) -> Step {
    let node = match doc.node(node_id) {
        Ok(Some(node)) => node,
        Ok(None) => return Step::NodeMissingRecovery(node_id.to_string()),
        Err(e) => {
            debug!("lookup of node {} failed: {}", node_id, e);
            return Step::NodeMissingRecovery(node_id.to_string());
        }
    };

    let page = enclosing_page(&*doc, &node).or_else(|| {
        doc.pages()
            .into_iter()
            .find(|page| is_within(&*doc, &node, page))
    });
    let Some(page) = page else {
        return Step::Done(NavigationResult::failure(
            "Could not determine page for node",
        ));
    };

    if let Err(e) = doc.set_current_page(&page.id) {
        warn!("could not switch to page {}: {}", page.id, e);
        return Step::Done(NavigationResult::failure(format!(
            "Failed to navigate to node: {}",
            e
        )));
    }

    if !node.kind.is_directly_visible() {
        return Step::Done(NavigationResult::page(
            "Navigated to page (node is not directly visible)",
            page.name,
        ));
    }

    Step::Done(select_and_zoom(doc, node, page))
}

fn select_and_zoom<D: DocumentTree + ?Sized>(
    doc: &mut D,
    node: DocumentNode,
    page: DocumentNode,
) -> NavigationResult {
    let targets = vec![node.id.clone()];
    let focused = doc
        .select(&targets)
        .and_then(|_| doc.scroll_and_zoom_into_view(&targets));

    match focused {
        Ok(()) => NavigationResult {
            success: true,
            message: "Navigated to comment location".to_string(),
            navigated_to: Some(NavigatedTo::Node),
            page_name: Some(page.name),
            node_id: Some(node.id),
            node_name: Some(if node.name.is_empty() {
                "Unnamed".to_string()
            } else {
                node.name
            }),
            node_type: Some(node.kind),
            ..Default::default()
        },
        Err(e) => {
            warn!("could not select node {}: {}", node.id, e);
            NavigationResult::page("Navigated to page (could not zoom to node)", page.name)
        }
    }
}

fn recover_missing_node<D: DocumentTree + ?Sized>(
    doc: &mut D,
    node_id: &str,
    comment: &NormalizedComment,
) -> Step {
    if let Some(page_id) = comment.location.page_id.as_deref() {
        match doc.node(page_id) {
            Ok(Some(page)) if page.is_page() => match doc.set_current_page(&page.id) {
                Ok(()) => {
                    return Step::Done(
                        NavigationResult::page(
                            "Navigated to page (node may have been deleted)",
                            page.name,
                        )
                        .with_warning(NODE_DELETED_WARNING),
                    );
                }
                Err(e) => warn!("could not switch to page {}: {}", page_id, e),
            },
            Ok(_) => warn!("could not find page {}", page_id),
            Err(e) => warn!("could not find page {}: {}", page_id, e),
        }
    }

    if let Some(page_name) = comment.location.page_name.as_deref() {
        if let Some(page) = find_page_by_name(&*doc, page_name) {
            if doc.set_current_page(&page.id).is_ok() {
                return Step::Done(
                    NavigationResult::page("Navigated to page by name (node not found)", page.name)
                        .with_warning(NODE_DELETED_WARNING),
                );
            }
        }
    }

    Step::Done(NavigationResult {
        node_id: Some(node_id.to_string()),
        ..NavigationResult::failure(
            "Node not found. It may have been deleted or moved to a different file.",
        )
    })
}

fn try_page<D: DocumentTree + ?Sized>(doc: &mut D, page_id: &str) -> Step {
    match doc.node(page_id) {
        Ok(Some(page)) if page.is_page() => Step::Done(focus_page(doc, page)),
        Ok(_) => Step::PageMissingRecovery,
        Err(e) => {
            debug!("lookup of page {} failed: {}", page_id, e);
            Step::PageMissingRecovery
        }
    }
}

fn recover_missing_page<D: DocumentTree + ?Sized>(doc: &mut D, comment: &NormalizedComment) -> Step {
    let page = comment
        .location
        .page_name
        .as_deref()
        .and_then(|name| find_page_by_name(&*doc, name));

    match page {
        Some(page) => Step::Done(focus_page(doc, page)),
        None => Step::Done(NavigationResult::failure(
            "Page not found. It may have been deleted or renamed.",
        )),
    }
}

fn focus_page<D: DocumentTree + ?Sized>(doc: &mut D, page: DocumentNode) -> NavigationResult {
    let focused = doc
        .set_current_page(&page.id)
        .and_then(|_| doc.scroll_and_zoom_into_view(&[page.id.clone()]));

    match focused {
        Ok(()) => NavigationResult::page("Navigated to page", page.name),
        Err(e) => {
            warn!("could not focus page {}: {}", page.id, e);
            NavigationResult::failure(format!("Failed to navigate to page: {}", e))
        }
    }
}

fn file_level<D: DocumentTree + ?Sized>(doc: &mut D) -> Step {
    let Some(first) = doc.pages().into_iter().next() else {
        return Step::Done(NavigationResult::failure(
            "This is a file-level comment with no specific location to navigate to",
        ));
    };

    let result = match doc.set_current_page(&first.id) {
        Ok(()) => NavigationResult {
            success: true,
            message: "This is a file-level comment (no specific location)".to_string(),
            navigated_to: Some(NavigatedTo::File),
            page_name: Some(first.name),
            info: Some(FILE_LEVEL_INFO.to_string()),
            ..Default::default()
        },
        Err(e) => NavigationResult::failure(format!("Could not handle file-level comment: {}", e)),
    };
    Step::Done(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::normalize::normalize_comments;
    use crate::comments::{NodeRef, PageRef, PreparedComment};
    use crate::document::{DocumentError, MemoryDocument, NodeKind};
    use chrono::Utc;
    use std::collections::HashSet;

    /// Memory document that can be told to fail like the host does.
    struct FlakyDocument {
        inner: MemoryDocument,
        failing_lookups: HashSet<String>,
        fail_selection: bool,
    }

    impl FlakyDocument {
        fn new(inner: MemoryDocument) -> Self {
            Self {
                inner,
                failing_lookups: HashSet::new(),
                fail_selection: false,
            }
        }
    }

    impl DocumentTree for FlakyDocument {
        fn node(&self, id: &str) -> Result<Option<DocumentNode>, DocumentError> {
            if self.failing_lookups.contains(id) {
                return Err(DocumentError::Host(format!("invalid node id {}", id)));
            }
            self.inner.node(id)
        }

        fn top_level(&self) -> Vec<DocumentNode> {
            self.inner.top_level()
        }

        fn children(&self, id: &str) -> Vec<DocumentNode> {
            self.inner.children(id)
        }

        fn current_page(&self) -> Option<DocumentNode> {
            self.inner.current_page()
        }

        fn set_current_page(&mut self, page_id: &str) -> Result<(), DocumentError> {
            self.inner.set_current_page(page_id)
        }

        fn select(&mut self, node_ids: &[String]) -> Result<(), DocumentError> {
            if self.fail_selection {
                return Err(DocumentError::Host("selection locked".to_string()));
            }
            self.inner.select(node_ids)
        }

        fn scroll_and_zoom_into_view(&mut self, node_ids: &[String]) -> Result<(), DocumentError> {
            self.inner.scroll_and_zoom_into_view(node_ids)
        }
    }

    fn document() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_page("1:0", "Home").unwrap();
        doc.add_page("1:1", "Checkout").unwrap();
        doc.add_node("1:1", "5:1", "Cart", NodeKind::Frame).unwrap();
        doc.add_node("5:1", "5:2", "", NodeKind::Rectangle).unwrap();
        doc.add_node("1:1", "5:3", "Variants", NodeKind::ComponentSet).unwrap();
        doc
    }

    fn comment_at(node_id: Option<&str>, page: Option<(&str, &str)>) -> NormalizedComment {
        let prepared = PreparedComment {
            id: "c1".to_string(),
            created_at: Utc::now().to_rfc3339(),
            message: "check this".to_string(),
            node_id: node_id.map(str::to_string),
            page: page.map(|(id, name)| PageRef {
                id: id.to_string(),
                name: name.to_string(),
            }),
            node: node_id.map(|id| NodeRef {
                id: id.to_string(),
                name: "Cart".to_string(),
                kind: NodeKind::Frame,
            }),
            ..Default::default()
        };
        normalize_comments(&[prepared], Utc::now()).remove(0)
    }

    // ==================== Node tier ====================

    #[test]
    fn test_visible_node_is_selected_and_focused() {
        let mut doc = document();
        let comment = comment_at(Some("5:1"), Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);

        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Node));
        assert_eq!(result.node_id.as_deref(), Some("5:1"));
        assert_eq!(result.node_name.as_deref(), Some("Cart"));
        assert_eq!(result.node_type, Some(NodeKind::Frame));
        assert_eq!(result.page_name.as_deref(), Some("Checkout"));
        assert_eq!(doc.current_page().unwrap().id, "1:1");
        assert_eq!(doc.selection(), ["5:1"]);
        assert_eq!(doc.viewport_focus(), ["5:1"]);
    }

    #[test]
    fn test_unnamed_node_reported_as_unnamed() {
        let mut doc = document();
        let comment = comment_at(Some("5:2"), None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert_eq!(result.node_name.as_deref(), Some("Unnamed"));
        assert_eq!(result.node_type, Some(NodeKind::Rectangle));
    }

    #[test]
    fn test_hidden_kind_only_switches_page() {
        let mut doc = document();
        let comment = comment_at(Some("5:3"), None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Page));
        assert_eq!(result.page_name.as_deref(), Some("Checkout"));
        assert_eq!(
            result.message,
            "Navigated to page (node is not directly visible)"
        );
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_selection_failure_degrades_to_page() {
        let mut doc = FlakyDocument::new(document());
        doc.fail_selection = true;
        let comment = comment_at(Some("5:1"), None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Page));
        assert_eq!(result.message, "Navigated to page (could not zoom to node)");
        assert_eq!(doc.current_page().unwrap().id, "1:1");
    }

    #[test]
    fn test_page_found_by_subtree_search_when_ancestry_breaks() {
        let mut doc = document();
        // the parent link loops, but the page still lists the node as a child
        doc.relink_parent("5:1", Some("5:1")).unwrap();
        let comment = comment_at(Some("5:2"), None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Node));
        assert_eq!(result.page_name.as_deref(), Some("Checkout"));
    }

    #[test]
    fn test_node_outside_every_page_cannot_determine_page() {
        let mut doc = document();
        let root = doc.root_id().to_string();
        doc.add_node(&root, "7:1", "Floating", NodeKind::Frame).unwrap();
        let comment = comment_at(Some("7:1"), Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(!result.success);
        assert_eq!(result.message, "Could not determine page for node");
    }

    // ==================== Missing-node recovery ====================

    #[test]
    fn test_deleted_node_falls_back_to_recorded_page() {
        let mut doc = document();
        doc.remove("5:1");
        let comment = comment_at(Some("5:1"), Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Page));
        assert_eq!(result.warning.as_deref(), Some(NODE_DELETED_WARNING));
        assert_eq!(doc.current_page().unwrap().id, "1:1");
    }

    #[test]
    fn test_throwing_lookup_falls_back_to_recorded_page() {
        let mut doc = FlakyDocument::new(document());
        doc.failing_lookups.insert("5:1".to_string());
        let comment = comment_at(Some("5:1"), Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Page));
        assert!(result.warning.is_some());
    }

    #[test]
    fn test_deleted_node_and_page_id_falls_back_to_page_name() {
        let mut doc = FlakyDocument::new(document());
        doc.failing_lookups.insert("5:1".to_string());
        doc.failing_lookups.insert("1:9".to_string());
        let comment = comment_at(Some("5:1"), Some(("1:9", " checkout ")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.message, "Navigated to page by name (node not found)");
        assert_eq!(result.page_name.as_deref(), Some("Checkout"));
        assert_eq!(result.warning.as_deref(), Some(NODE_DELETED_WARNING));
    }

    #[test]
    fn test_deleted_node_without_page_fails_with_node_id() {
        let mut doc = document();
        let comment = comment_at(Some("8:8"), None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(!result.success);
        assert_eq!(result.node_id.as_deref(), Some("8:8"));
        assert!(result.message.starts_with("Node not found"));
        assert!(result.navigated_to.is_none());
    }

    // ==================== Page tier ====================

    #[test]
    fn test_page_only_comment_focuses_page() {
        let mut doc = document();
        let comment = comment_at(None, Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::Page));
        assert_eq!(result.message, "Navigated to page");
        assert_eq!(doc.viewport_focus(), ["1:1"]);
    }

    #[test]
    fn test_page_id_pointing_at_non_page_uses_name() {
        let mut doc = document();
        let comment = comment_at(None, Some(("5:1", "HOME")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.page_name.as_deref(), Some("Home"));
        assert_eq!(doc.current_page().unwrap().id, "1:0");
    }

    #[test]
    fn test_renamed_and_deleted_page_fails() {
        let mut doc = document();
        doc.remove("1:1");
        let comment = comment_at(None, Some(("1:1", "Checkout")));

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(!result.success);
        assert_eq!(
            result.message,
            "Page not found. It may have been deleted or renamed."
        );
    }

    // ==================== File-level tier ====================

    #[test]
    fn test_file_level_goes_to_first_page() {
        let mut doc = document();
        doc.set_current_page("1:1").unwrap();
        let comment = comment_at(None, None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(result.success);
        assert_eq!(result.navigated_to, Some(NavigatedTo::File));
        assert_eq!(result.page_name.as_deref(), Some("Home"));
        assert_eq!(result.info.as_deref(), Some(FILE_LEVEL_INFO));
        assert_eq!(doc.current_page().unwrap().id, "1:0");
    }

    #[test]
    fn test_file_level_on_empty_document_fails() {
        let mut doc = MemoryDocument::new();
        let comment = comment_at(None, None);

        let result = navigate_to_comment(&mut doc, "c1", &comment);
        assert!(!result.success);
        assert!(result.navigated_to.is_none());
    }

    #[test]
    fn test_blank_comment_id_rejected() {
        let mut doc = document();
        let comment = comment_at(None, None);
        let result = navigate_to_comment(&mut doc, "  ", &comment);
        assert!(!result.success);
        assert_eq!(result.message, "Invalid comment ID");
    }

    #[test]
    fn test_result_serializes_without_empty_fields() {
        let json = serde_json::to_value(NavigationResult::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "message": "nope" }));
    }
}
