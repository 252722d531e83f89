//! Expansion state: which nodes are shown open in a collapsed-by-default view.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::arena::Forest;
use crate::domain::entities::{CurriculumNode, NodeId};

/// Ancestor ids that must be expanded for `selected` to be visible.
///
/// Follows `parent_id` links in the raw node list until a root, a dangling
/// reference or a revisited node. The selected node itself is not included;
/// an unknown id yields an empty set.
pub fn compute_expansion_path(nodes: &[CurriculumNode], selected: &NodeId) -> BTreeSet<NodeId> {
    let index: HashMap<&NodeId, &CurriculumNode> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut path = BTreeSet::new();

    if selected.is_blank() {
        return path;
    }
    let Some(mut current) = index.get(selected).copied() else {
        debug!("expansion path: {} not in node set", selected);
        return path;
    };
    while let Some(parent_id) = &current.parent_id {
        let Some(parent) = index.get(parent_id).copied() else {
            break;
        };
        if parent_id == selected || !path.insert(parent_id.clone()) {
            warn!("expansion path for {}: parent cycle at {}", selected, parent_id);
            break;
        }
        current = parent;
    }
    path
}

/// Caller-owned set of expanded node ids.
///
/// Nothing here is hidden view state: the set can be stored and handed back
/// to restore a view after navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionState {
    #[serde(default)]
    expanded: BTreeSet<NodeId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = NodeId>>(ids: I) -> Self {
        Self {
            expanded: ids.into_iter().collect(),
        }
    }

    /// Every node that has children.
    pub fn all(forest: &Forest) -> Self {
        Self::from_ids(
            forest
                .iter()
                .filter(|(_, entry)| !entry.is_leaf())
                .map(|(_, entry)| entry.id().clone()),
        )
    }

    /// Nodes with children in the first `levels` levels; `levels = 1` opens
    /// the roots.
    pub fn expand_levels(forest: &Forest, levels: usize) -> Self {
        Self::from_ids(
            forest
                .iter()
                .filter(|(depth, entry)| *depth < levels && !entry.is_leaf())
                .map(|(_, entry)| entry.id().clone()),
        )
    }

    /// Default view: the first `levels` levels plus the selected node's
    /// ancestors.
    pub fn initial(forest: &Forest, selected: Option<&NodeId>, levels: usize) -> Self {
        let mut state = Self::expand_levels(forest, levels);
        if let Some(id) = selected {
            state.expanded.extend(forest.expansion_path(id));
        }
        state
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    /// Returns false if `id` was already expanded.
    pub fn expand(&mut self, id: NodeId) -> bool {
        self.expanded.insert(id)
    }

    /// Returns false if `id` was not expanded.
    pub fn collapse(&mut self, id: &NodeId) -> bool {
        self.expanded.remove(id)
    }

    /// Flip one node; siblings and descendants keep their own state.
    /// Returns the new state of `id`.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn merge(&mut self, other: &ExpansionState) {
        self.expanded.extend(other.expanded.iter().cloned());
    }

    /// Drop ids that no longer exist in `forest`.
    pub fn retain_known(&mut self, forest: &Forest) {
        self.expanded.retain(|id| forest.contains(id));
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.expanded.iter()
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::build_tree;
    use crate::domain::entities::NodeType;

    fn chain() -> Vec<CurriculumNode> {
        vec![
            CurriculumNode::new("a", "A", NodeType::Subject),
            CurriculumNode::new("b", "B", NodeType::Unit).with_parent("a"),
            CurriculumNode::new("c", "C", NodeType::Topic).with_parent("b"),
            CurriculumNode::new("d", "D", NodeType::Unit).with_parent("a"),
        ]
    }

    #[test]
    fn given_dangling_parent_when_computing_path_then_stops_before_it() {
        let nodes = vec![
            CurriculumNode::new("b", "B", NodeType::Unit).with_parent("gone"),
            CurriculumNode::new("c", "C", NodeType::Topic).with_parent("b"),
        ];
        let path = compute_expansion_path(&nodes, &"c".into());
        assert_eq!(path, BTreeSet::from([NodeId::from("b")]));
    }

    #[test]
    fn given_unknown_selection_when_computing_path_then_is_empty() {
        assert!(compute_expansion_path(&chain(), &"nope".into()).is_empty());
    }

    #[test]
    fn given_blank_selection_when_computing_path_then_is_empty() {
        let mut nodes = chain();
        nodes.push(CurriculumNode::new("", "Blank", NodeType::Topic).with_parent("c"));
        assert!(compute_expansion_path(&nodes, &"".into()).is_empty());
    }

    #[test]
    fn given_cycle_through_selection_when_computing_path_then_terminates() {
        let nodes = vec![
            CurriculumNode::new("x", "X", NodeType::Unit).with_parent("y"),
            CurriculumNode::new("y", "Y", NodeType::Unit).with_parent("x"),
        ];
        let path = compute_expansion_path(&nodes, &"x".into());
        assert_eq!(path, BTreeSet::from([NodeId::from("y")]));
    }

    #[test]
    fn given_levels_when_expanding_then_only_parents_within_depth_open() {
        let forest = build_tree(&chain()).unwrap();
        let state = ExpansionState::expand_levels(&forest, 1);
        assert!(state.is_expanded(&"a".into()));
        assert!(!state.is_expanded(&"b".into()));
        assert_eq!(ExpansionState::expand_levels(&forest, 0).len(), 0);
        // leaves are never recorded as expanded
        assert_eq!(ExpansionState::all(&forest).len(), 2);
    }

    #[test]
    fn given_selection_when_building_initial_state_then_merges_levels_and_path() {
        let forest = build_tree(&chain()).unwrap();
        let state = ExpansionState::initial(&forest, Some(&"c".into()), 0);
        assert_eq!(
            state.ids().cloned().collect::<Vec<_>>(),
            vec![NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn given_state_when_toggling_then_only_that_node_changes() {
        let mut state = ExpansionState::from_ids(["a".into(), "b".into()]);
        assert!(!state.toggle(&"b".into()));
        assert!(state.is_expanded(&"a".into()));
        assert!(!state.is_expanded(&"b".into()));
        assert!(state.toggle(&"b".into()));
        assert!(state.is_expanded(&"b".into()));
    }

    #[test]
    fn given_stale_ids_when_retaining_known_then_drops_them() {
        let forest = build_tree(&chain()).unwrap();
        let mut state = ExpansionState::from_ids(["a".into(), "deleted".into()]);
        state.retain_known(&forest);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn given_state_when_serializing_then_round_trips_through_toml() {
        let state = ExpansionState::from_ids([NodeId::from(1), NodeId::from("algebra")]);
        let text = toml::to_string(&state).unwrap();
        let back: ExpansionState = toml::from_str(&text).unwrap();
        assert_eq!(state, back);
    }
}
