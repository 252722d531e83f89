use std::collections::{BTreeSet, HashMap};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{CurriculumNode, NodeId};

/// Tree entry in the arena-based forest.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Curriculum record for this entry
    pub node: CurriculumNode,
    /// Index of the effective parent, None for roots
    pub parent: Option<Index>,
    /// Indices of child entries, in sibling order
    pub children: Vec<Index>,
}

impl TreeEntry {
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }

    /// Derived count of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based forest of curriculum trees.
///
/// Entries are owned by the arena; parents and children refer to each other by
/// index. The parent graph is acyclic by construction, so every upward walk
/// terminates at a root.
#[derive(Debug, Clone)]
pub struct Forest {
    arena: Arena<TreeEntry>,
    roots: Vec<Index>,
    by_id: HashMap<NodeId, Index>,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            arena: Arena::with_capacity(n),
            roots: Vec::with_capacity(n),
            by_id: HashMap::with_capacity(n),
        }
    }

    /// Store a node without linking it anywhere yet.
    pub(crate) fn insert(&mut self, node: CurriculumNode) -> Index {
        let id = node.id.clone();
        let idx = self.arena.insert(TreeEntry {
            node,
            parent: None,
            children: Vec::new(),
        });
        self.by_id.insert(id, idx);
        idx
    }

    /// Link `child` under `parent`, or make it a root.
    ///
    /// Callers attach in sibling order; child lists keep insertion order.
    pub(crate) fn attach(&mut self, child: Index, parent: Option<Index>) {
        let linked = parent.filter(|&p| match self.arena.get_mut(p) {
            Some(entry) => {
                entry.children.push(child);
                true
            }
            None => false,
        });
        match linked {
            Some(p) => {
                if let Some(entry) = self.arena.get_mut(child) {
                    entry.parent = Some(p);
                }
            }
            None => self.roots.push(child),
        }
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn get(&self, idx: Index) -> Option<&TreeEntry> {
        self.arena.get(idx)
    }

    pub fn find(&self, id: &NodeId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn entry(&self, id: &NodeId) -> Option<&TreeEntry> {
        self.find(id).and_then(|idx| self.get(idx))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Total number of entries across all trees.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over all trees, roots in sibling order.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Number of levels of the deepest tree; 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Ids of all entries without children, in pre-order.
    pub fn leaf_nodes(&self) -> Vec<&NodeId> {
        self.iter()
            .filter(|(_, entry)| entry.is_leaf())
            .map(|(_, entry)| entry.id())
            .collect()
    }

    /// Ancestor chain of `id`, root first, excluding `id` itself.
    ///
    /// Unknown ids have no ancestors.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.entry(id).and_then(|entry| entry.parent);
        while let Some(idx) = current {
            match self.get(idx) {
                Some(entry) => {
                    chain.push(entry.id().clone());
                    current = entry.parent;
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// Ids that must be expanded for `id` to be visible.
    pub fn expansion_path(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.ancestors(id).into_iter().collect()
    }

    /// True if `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }
}

/// Pre-order iterator yielding `(depth, entry)`.
pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, usize)>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (usize, &'a TreeEntry);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            if let Some(entry) = self.forest.get(idx) {
                // reverse so the first child is popped first
                for &child in entry.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((depth, entry));
            }
        }
        None
    }
}
