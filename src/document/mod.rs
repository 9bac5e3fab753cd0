//! Query surface over the host's live document tree.
//!
//! Nodes are addressed by the host's string ids. Everything handed out is an
//! owned snapshot of the node record, so callers never hold references into
//! the host's graph.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;

pub use memory::MemoryDocument;

/// Node type tag as the host reports it (`FRAME`, `TEXT`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Document,
    Page,
    Frame,
    Group,
    Component,
    ComponentSet,
    Instance,
    Rectangle,
    Ellipse,
    Polygon,
    Star,
    Vector,
    Text,
    Line,
    BooleanOperation,
    Slice,
    Stamp,
    ShapeWithText,
    Connector,
    CodeBlock,
    Sticky,
    Widget,
    Embed,
    LinkUnfurl,
    Media,
    Section,
    Highlight,
    WashiTape,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Document => "DOCUMENT",
            NodeKind::Page => "PAGE",
            NodeKind::Frame => "FRAME",
            NodeKind::Group => "GROUP",
            NodeKind::Component => "COMPONENT",
            NodeKind::ComponentSet => "COMPONENT_SET",
            NodeKind::Instance => "INSTANCE",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Polygon => "POLYGON",
            NodeKind::Star => "STAR",
            NodeKind::Vector => "VECTOR",
            NodeKind::Text => "TEXT",
            NodeKind::Line => "LINE",
            NodeKind::BooleanOperation => "BOOLEAN_OPERATION",
            NodeKind::Slice => "SLICE",
            NodeKind::Stamp => "STAMP",
            NodeKind::ShapeWithText => "SHAPE_WITH_TEXT",
            NodeKind::Connector => "CONNECTOR",
            NodeKind::CodeBlock => "CODE_BLOCK",
            NodeKind::Sticky => "STICKY",
            NodeKind::Widget => "WIDGET",
            NodeKind::Embed => "EMBED",
            NodeKind::LinkUnfurl => "LINK_UNFURL",
            NodeKind::Media => "MEDIA",
            NodeKind::Section => "SECTION",
            NodeKind::Highlight => "HIGHLIGHT",
            NodeKind::WashiTape => "WASHI_TAPE",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Kinds that can be selected and zoomed to on the canvas.
    pub fn is_directly_visible(&self) -> bool {
        !matches!(
            self,
            NodeKind::Document | NodeKind::Page | NodeKind::ComponentSet | NodeKind::Other(_)
        )
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        match tag {
            "DOCUMENT" => NodeKind::Document,
            "PAGE" => NodeKind::Page,
            "FRAME" => NodeKind::Frame,
            "GROUP" => NodeKind::Group,
            "COMPONENT" => NodeKind::Component,
            "COMPONENT_SET" => NodeKind::ComponentSet,
            "INSTANCE" => NodeKind::Instance,
            "RECTANGLE" => NodeKind::Rectangle,
            "ELLIPSE" => NodeKind::Ellipse,
            "POLYGON" => NodeKind::Polygon,
            "STAR" => NodeKind::Star,
            "VECTOR" => NodeKind::Vector,
            "TEXT" => NodeKind::Text,
            "LINE" => NodeKind::Line,
            "BOOLEAN_OPERATION" => NodeKind::BooleanOperation,
            "SLICE" => NodeKind::Slice,
            "STAMP" => NodeKind::Stamp,
            "SHAPE_WITH_TEXT" => NodeKind::ShapeWithText,
            "CONNECTOR" => NodeKind::Connector,
            "CODE_BLOCK" => NodeKind::CodeBlock,
            "STICKY" => NodeKind::Sticky,
            "WIDGET" => NodeKind::Widget,
            "EMBED" => NodeKind::Embed,
            "LINK_UNFURL" => NodeKind::LinkUnfurl,
            "MEDIA" => NodeKind::Media,
            "SECTION" => NodeKind::Section,
            "HIGHLIGHT" => NodeKind::Highlight,
            "WASHI_TAPE" => NodeKind::WashiTape,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::from(tag.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one node record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// The host reports the root's parent as itself in some states; callers
    /// walking ancestry must stop when `parent_id == id`.
    pub parent_id: Option<String>,
}

impl DocumentNode {
    pub fn is_page(&self) -> bool {
        self.kind == NodeKind::Page
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("node {0} does not exist")]
    NodeNotFound(String),
    #[error("node {0} is not a page")]
    NotAPage(String),
    #[error("{0}")]
    Host(String),
}

/// The host capabilities the plugin relies on.
///
/// Lookups may fail outright (the host throws for malformed or foreign ids)
/// or succeed with nothing; callers treat both as "missing".
pub trait DocumentTree {
    fn node(&self, id: &str) -> Result<Option<DocumentNode>, DocumentError>;

    /// Direct children of the document root, in document order.
    fn top_level(&self) -> Vec<DocumentNode>;

    /// Direct children of `id`; empty when the node is unknown.
    fn children(&self, id: &str) -> Vec<DocumentNode>;

    fn current_page(&self) -> Option<DocumentNode>;

    fn set_current_page(&mut self, page_id: &str) -> Result<(), DocumentError>;

    /// Replaces the selection on the current page.
    fn select(&mut self, node_ids: &[String]) -> Result<(), DocumentError>;

    fn scroll_and_zoom_into_view(&mut self, node_ids: &[String]) -> Result<(), DocumentError>;

    /// Top-level children that are pages.
    fn pages(&self) -> Vec<DocumentNode> {
        self.top_level()
            .into_iter()
            .filter(DocumentNode::is_page)
            .collect()
    }
}

/// Walks up from `node` to the first ancestor of page kind. Stops on a
/// self-parented node and on any cycle.
pub fn enclosing_page<D: DocumentTree + ?Sized>(doc: &D, node: &DocumentNode) -> Option<DocumentNode> {
    if node.is_page() {
        return Some(node.clone());
    }

    let mut visited = vec![node.id.clone()];
    let mut parent_id = node.parent_id.clone();

    while let Some(id) = parent_id {
        if visited.contains(&id) {
            break;
        }
        let current = doc.node(&id).ok().flatten()?;
        if current.is_page() {
            return Some(current);
        }
        visited.push(id);
        parent_id = current.parent_id.clone();
    }

    None
}

/// True when `node` sits anywhere in `page`'s subtree, found by walking
/// child lists down from the page.
pub fn is_within<D: DocumentTree + ?Sized>(doc: &D, node: &DocumentNode, page: &DocumentNode) -> bool {
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending = vec![page.id.clone()];

    while let Some(id) = pending.pop() {
        if id == node.id {
            return true;
        }
        if !visited.insert(id.clone()) {
            continue;
        }
        pending.extend(doc.children(&id).into_iter().map(|child| child.id));
    }

    false
}

/// Case-insensitive, whitespace-trimmed exact match against page names.
pub fn find_page_by_name<D: DocumentTree + ?Sized>(doc: &D, name: &str) -> Option<DocumentNode> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    doc.pages()
        .into_iter()
        .find(|page| page.name.trim().to_lowercase() == wanted)
}
