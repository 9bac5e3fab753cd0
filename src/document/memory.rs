use std::collections::HashMap;

use serde::Deserialize;

use crate::document::{DocumentError, DocumentNode, DocumentTree, NodeKind};

pub const ROOT_ID: &str = "0:0";

#[derive(Debug, Clone)]
struct NodeRecord {
    name: String,
    kind: NodeKind,
    parent_id: Option<String>,
    children: Vec<String>,
}

/// Serialized form of a document tree, as exported from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "document_kind")]
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

fn document_kind() -> NodeKind {
    NodeKind::Document
}

/// Document tree held as an id -> record table.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    root_id: String,
    nodes: HashMap<String, NodeRecord>,
    current_page: Option<String>,
    selection: Vec<String>,
    viewport: Vec<String>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID.to_string(),
            NodeRecord {
                name: "Document".to_string(),
                kind: NodeKind::Document,
                parent_id: None,
                children: Vec::new(),
            },
        );
        Self {
            root_id: ROOT_ID.to_string(),
            nodes,
            current_page: None,
            selection: Vec::new(),
            viewport: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let root: SnapshotNode = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(root))
    }

    pub fn from_snapshot(root: SnapshotNode) -> Self {
        let mut doc = Self {
            root_id: root.id.clone(),
            nodes: HashMap::new(),
            current_page: None,
            selection: Vec::new(),
            viewport: Vec::new(),
        };
        doc.insert_snapshot(root, None);
        doc.current_page = doc.pages().first().map(|p| p.id.clone());
        doc
    }

    fn insert_snapshot(&mut self, node: SnapshotNode, parent_id: Option<String>) {
        let id = node.id.clone();
        if let Some(parent) = parent_id.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id.clone());
        }
        self.nodes.insert(
            id.clone(),
            NodeRecord {
                name: node.name,
                kind: node.kind,
                parent_id,
                children: Vec::new(),
            },
        );
        for child in node.children {
            self.insert_snapshot(child, Some(id.clone()));
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Adds a page under the root. The first page added becomes current.
    pub fn add_page(&mut self, id: &str, name: &str) -> Result<(), DocumentError> {
        let root = self.root_id.clone();
        self.add_node(&root, id, name, NodeKind::Page)?;
        if self.current_page.is_none() {
            self.current_page = Some(id.to_string());
        }
        Ok(())
    }

    pub fn add_node(
        &mut self,
        parent_id: &str,
        id: &str,
        name: &str,
        kind: NodeKind,
    ) -> Result<(), DocumentError> {
        let parent = self
            .nodes
            .get_mut(parent_id)
            .ok_or_else(|| DocumentError::NodeNotFound(parent_id.to_string()))?;
        parent.children.push(id.to_string());
        self.nodes.insert(
            id.to_string(),
            NodeRecord {
                name: name.to_string(),
                kind,
                parent_id: Some(parent_id.to_string()),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Deletes a node and its whole subtree.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(record) = self.nodes.remove(id) else {
            return false;
        };
        if let Some(parent) = record.parent_id.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| child != id);
        }
        for child in record.children {
            self.remove(&child);
        }
        self.selection.retain(|s| s != id);
        if self.current_page.as_deref() == Some(id) {
            self.current_page = None;
        }
        true
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), DocumentError> {
        let record = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
        record.name = name.to_string();
        Ok(())
    }

    /// Overwrites the parent link without touching child lists. Lets a caller
    /// reproduce host states such as a self-parented node.
    pub fn relink_parent(&mut self, id: &str, parent_id: Option<&str>) -> Result<(), DocumentError> {
        let record = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
        record.parent_id = parent_id.map(str::to_string);
        Ok(())
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Ids the viewport was last focused on.
    pub fn viewport_focus(&self) -> &[String] {
        &self.viewport
    }

    fn snapshot(&self, id: &str) -> Option<DocumentNode> {
        self.nodes.get(id).map(|record| DocumentNode {
            id: id.to_string(),
            name: record.name.clone(),
            kind: record.kind.clone(),
            parent_id: record.parent_id.clone(),
        })
    }

    fn ensure_all_exist(&self, node_ids: &[String]) -> Result<(), DocumentError> {
        match node_ids.iter().find(|id| !self.nodes.contains_key(*id)) {
            Some(missing) => Err(DocumentError::NodeNotFound(missing.clone())),
            None => Ok(()),
        }
    }
}

impl DocumentTree for MemoryDocument {
    fn node(&self, id: &str) -> Result<Option<DocumentNode>, DocumentError> {
        Ok(self.snapshot(id))
    }

    fn top_level(&self) -> Vec<DocumentNode> {
        self.children(&self.root_id)
    }

    fn children(&self, id: &str) -> Vec<DocumentNode> {
        self.nodes
            .get(id)
            .map(|record| {
                record
                    .children
                    .iter()
                    .filter_map(|child| self.snapshot(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn current_page(&self) -> Option<DocumentNode> {
        self.current_page.as_deref().and_then(|id| self.snapshot(id))
    }

    fn set_current_page(&mut self, page_id: &str) -> Result<(), DocumentError> {
        let node = self
            .snapshot(page_id)
            .ok_or_else(|| DocumentError::NodeNotFound(page_id.to_string()))?;
        if !node.is_page() {
            return Err(DocumentError::NotAPage(page_id.to_string()));
        }
        if self.current_page.as_deref() != Some(page_id) {
            self.selection.clear();
        }
        self.current_page = Some(page_id.to_string());
        Ok(())
    }

    fn select(&mut self, node_ids: &[String]) -> Result<(), DocumentError> {
        self.ensure_all_exist(node_ids)?;
        self.selection = node_ids.to_vec();
        Ok(())
    }

    fn scroll_and_zoom_into_view(&mut self, node_ids: &[String]) -> Result<(), DocumentError> {
        self.ensure_all_exist(node_ids)?;
        self.viewport = node_ids.to_vec();
        Ok(())
    }
}
