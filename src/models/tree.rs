use serde::{Deserialize, Serialize};

/// A node of the document rendered by the front-end tree widget.
///
/// The field names are the widget's wire contract: `id`, `text`,
/// `children` and the optional `state`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
    pub children: TreeChildren,
}

/// Either a lazy-expansion hint or the materialized children of a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TreeChildren {
    /// `true` when the node has children the widget can load on demand.
    Lazy(bool),
    Loaded(Vec<TreeNode>),
}

/// Display flags for nodes on the pre-expanded path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeState {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub opened: bool,
}

impl TreeNode {
    /// A collapsed node carrying only its label and whether it has children.
    pub fn stub(id: impl Into<String>, text: impl Into<String>, has_children: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            state: None,
            children: TreeChildren::Lazy(has_children),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.state.is_some_and(|s| s.selected)
    }

    pub fn is_opened(&self) -> bool {
        self.state.is_some_and(|s| s.opened)
    }

    /// Materialized children, empty for stubs.
    pub fn loaded_children(&self) -> &[TreeNode] {
        match &self.children {
            TreeChildren::Loaded(children) => children,
            TreeChildren::Lazy(_) => &[],
        }
    }
}
