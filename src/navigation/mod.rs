use serde::Serialize;

use crate::document::NodeKind;

pub mod resolver;

pub use resolver::navigate_to_comment;

pub const NODE_DELETED_WARNING: &str =
    "The original node referenced by this comment may have been deleted";
pub const FILE_LEVEL_INFO: &str =
    "File-level comments are not associated with a specific node or page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigatedTo {
    Node,
    Page,
    File,
}

/// Outcome of a navigation attempt. Failures are values, never errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigated_to: Option<NavigatedTo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl NavigationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn page(message: impl Into<String>, page_name: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            navigated_to: Some(NavigatedTo::Page),
            page_name: Some(page_name.into()),
            ..Default::default()
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}
