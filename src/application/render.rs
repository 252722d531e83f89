//! Collapsible tree view: visible rows and terminal rendering.

use std::collections::BTreeSet;

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;

use crate::domain::{ExpansionState, Forest, NodeId, NodeType, TreeEntry};

const EXPANDED: &str = "▾";
const COLLAPSED: &str = "▸";
const LEAF: &str = "·";
const SELECTED: &str = "◀";

/// One visible line of the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub depth: usize,
    pub child_count: usize,
    pub expanded: bool,
    pub selected: bool,
    /// Row is an ancestor of the selected node
    pub on_selected_path: bool,
}

impl Row {
    pub fn label(&self) -> String {
        let marker = if self.child_count == 0 {
            LEAF
        } else if self.expanded {
            EXPANDED
        } else {
            COLLAPSED
        };
        let mut label = format!("{} {} [{}]", marker, self.name, self.node_type);
        if self.child_count > 0 && !self.expanded {
            label.push_str(&format!(" (+{})", self.child_count));
        }
        if self.selected {
            label.push(' ');
            label.push_str(SELECTED);
        }
        label
    }

    fn styled_label(&self) -> String {
        let label = self.label();
        if self.selected {
            label.green().bold().to_string()
        } else if self.on_selected_path {
            label.cyan().to_string()
        } else {
            label
        }
    }
}

/// Read-only view over a forest with caller-controlled expansion.
pub struct TreeView<'a> {
    forest: &'a Forest,
    state: &'a ExpansionState,
    selected: Option<&'a NodeId>,
    selected_path: BTreeSet<NodeId>,
}

impl<'a> TreeView<'a> {
    pub fn new(forest: &'a Forest, state: &'a ExpansionState, selected: Option<&'a NodeId>) -> Self {
        let selected_path = selected
            .map(|id| forest.expansion_path(id))
            .unwrap_or_default();
        Self {
            forest,
            state,
            selected,
            selected_path,
        }
    }

    /// Visible rows in pre-order. Roots are always visible; a child is visible
    /// only while every ancestor is expanded.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut stack: Vec<(Index, usize)> =
            self.forest.roots().iter().rev().map(|&idx| (idx, 0)).collect();

        while let Some((idx, depth)) = stack.pop() {
            let Some(entry) = self.forest.get(idx) else {
                continue;
            };
            let row = self.row(entry, depth);
            if row.expanded {
                for &child in entry.children.iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
            rows.push(row);
        }
        rows
    }

    /// One `termtree` per root, collapsed subtrees left out.
    pub fn render(&self, color: bool) -> Vec<Tree<String>> {
        self.forest
            .roots()
            .iter()
            .filter_map(|&idx| self.render_entry(idx, 0, color))
            .collect()
    }

    fn render_entry(&self, idx: Index, depth: usize, color: bool) -> Option<Tree<String>> {
        let entry = self.forest.get(idx)?;
        let row = self.row(entry, depth);
        let label = if color { row.styled_label() } else { row.label() };
        let mut tree = Tree::new(label);
        if row.expanded {
            for &child in &entry.children {
                if let Some(leaf) = self.render_entry(child, depth + 1, color) {
                    tree.push(leaf);
                }
            }
        }
        Some(tree)
    }

    fn row(&self, entry: &TreeEntry, depth: usize) -> Row {
        let id = entry.id();
        Row {
            id: id.clone(),
            name: entry.node.name.clone(),
            node_type: entry.node.node_type.clone(),
            depth,
            child_count: entry.child_count(),
            expanded: !entry.is_leaf() && self.state.is_expanded(id),
            selected: self.selected == Some(id),
            on_selected_path: self.selected_path.contains(id),
        }
    }
}

/// Render the whole forest as plain text, one tree after another.
pub fn render_forest(
    forest: &Forest,
    state: &ExpansionState,
    selected: Option<&NodeId>,
    color: bool,
) -> String {
    TreeView::new(forest, state, selected)
        .render(color)
        .iter()
        .map(|tree| tree.to_string())
        .collect()
}
