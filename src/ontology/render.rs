//! ASCII rendering of tree-widget documents, used by the CLI.

use crate::models::{TreeChildren, TreeNode};

const SELECTED: char = '●';
const COLLAPSED: char = '+';
const LEAF: char = '·';
const OPENED: char = '▾';

fn node_symbol(node: &TreeNode) -> char {
    if node.is_selected() {
        return SELECTED;
    }
    match &node.children {
        TreeChildren::Loaded(_) => OPENED,
        TreeChildren::Lazy(true) => COLLAPSED,
        TreeChildren::Lazy(false) => LEAF,
    }
}

/// Render a tree as ASCII art.
///
/// Example output:
/// ```text
/// ▾ plant trait [TO:0000387]
/// ├── ▾ plant morphology trait [TO:0000017]
/// │   └── ● plant height [TO:0000207]
/// └── + biochemical trait [TO:0000277]
/// + quality [TO:0000000]
/// ```
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        render_node(&mut output, node, "", false, true);
    }
    output
}

fn render_node(output: &mut String, node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    if !is_root {
        output.push_str(prefix);
        output.push_str(if is_last { "└── " } else { "├── " });
    }
    output.push(node_symbol(node));
    output.push(' ');
    output.push_str(&node.text);
    output.push_str(" [");
    output.push_str(&node.id);
    output.push_str("]\n");

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    let children = node.loaded_children();
    for (i, child) in children.iter().enumerate() {
        render_node(output, child, &child_prefix, i == children.len() - 1, false);
    }
}
