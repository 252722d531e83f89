//! Tree builder: turns a flat node list into an ordered forest.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::entities::{sibling_cmp, CurriculumNode, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// A parent cycle found in the input and how it was broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleWarning {
    /// Node promoted to root to break the cycle
    pub promoted: NodeId,
    /// Cycle members in parent-walk order, starting at `promoted`
    pub members: Vec<NodeId>,
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {} -> {} broken at {}",
            self.members.iter().join(" -> "),
            self.promoted,
            self.promoted
        )
    }
}

/// Forest plus everything that had to be repaired to build it.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub forest: Forest,
    /// Nodes whose declared parent is not in the input, promoted to roots
    pub orphans: Vec<NodeId>,
    pub cycles: Vec<CycleWarning>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.cycles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Constructs curriculum forests from flat node lists.
///
/// Holds scratch buffers so repeated builds do not reallocate; every build
/// starts from a clean state.
pub struct TreeBuilder {
    index: HashMap<NodeId, usize>,
    visits: Vec<Visit>,
    path: Vec<usize>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            visits: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Build the forest for `nodes`.
    ///
    /// Roots and every child list are ordered by [`sibling_cmp`]. Nodes whose
    /// parent is missing become roots; parent cycles are broken by promoting
    /// the first node the walk would revisit. Only duplicate ids are rejected.
    #[instrument(level = "debug", skip_all, fields(nodes = nodes.len()))]
    pub fn build(&mut self, nodes: &[CurriculumNode]) -> DomainResult<BuildReport> {
        self.index.clear();
        self.index.reserve(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if node.id.is_blank() {
                return Err(DomainError::MissingId { index: pos });
            }
            if self.index.insert(node.id.clone(), pos).is_some() {
                return Err(DomainError::DuplicateId(node.id.clone()));
            }
        }

        let mut orphans = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let parent = match &node.parent_id {
                None => None,
                Some(parent_id) => match self.index.get(parent_id) {
                    Some(&pos) => Some(pos),
                    None => {
                        debug!("orphan {}: parent {} not found", node.id, parent_id);
                        orphans.push(node.id.clone());
                        None
                    }
                },
            };
            parents.push(parent);
        }

        let cycles = self.break_cycles(nodes, &mut parents);

        let mut forest = Forest::with_capacity(nodes.len());
        let slots: Vec<_> = nodes.iter().map(|node| forest.insert(node.clone())).collect();

        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by(|&a, &b| sibling_cmp(&nodes[a], &nodes[b]));
        for pos in order {
            forest.attach(slots[pos], parents[pos].map(|p| slots[p]));
        }

        debug!(
            "built {} roots from {} nodes ({} orphans, {} cycles)",
            forest.roots().len(),
            nodes.len(),
            orphans.len(),
            cycles.len()
        );
        Ok(BuildReport {
            forest,
            orphans,
            cycles,
        })
    }

    /// Three-colour walk up the parent links; every node is entered once.
    fn break_cycles(
        &mut self,
        nodes: &[CurriculumNode],
        parents: &mut [Option<usize>],
    ) -> Vec<CycleWarning> {
        self.visits.clear();
        self.visits.resize(nodes.len(), Visit::New);
        let mut cycles = Vec::new();

        for start in 0..nodes.len() {
            self.path.clear();
            let mut current = Some(start);
            while let Some(pos) = current {
                match self.visits[pos] {
                    Visit::Done => break,
                    Visit::New => {
                        self.visits[pos] = Visit::OnPath;
                        self.path.push(pos);
                        current = parents[pos];
                    }
                    Visit::OnPath => {
                        let from = self.path.iter().position(|&p| p == pos).unwrap_or(0);
                        let warning = CycleWarning {
                            promoted: nodes[pos].id.clone(),
                            members: self.path[from..]
                                .iter()
                                .map(|&p| nodes[p].id.clone())
                                .collect(),
                        };
                        warn!("parent {}", warning);
                        parents[pos] = None;
                        cycles.push(warning);
                        break;
                    }
                }
            }
            for &pos in &self.path {
                self.visits[pos] = Visit::Done;
            }
        }
        cycles
    }
}

/// Build the forest for `nodes`, discarding repair diagnostics.
pub fn build_tree(nodes: &[CurriculumNode]) -> DomainResult<Forest> {
    TreeBuilder::new().build(nodes).map(|report| report.forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NodeType;

    fn names(forest: &Forest, ids: &[generational_arena::Index]) -> Vec<String> {
        ids.iter()
            .filter_map(|&idx| forest.get(idx))
            .map(|e| e.node.name.clone())
            .collect()
    }

    #[test]
    fn given_self_parented_node_when_building_then_it_becomes_root() {
        let nodes = vec![CurriculumNode::new(1, "Loop", NodeType::Topic).with_parent(1)];
        let report = TreeBuilder::new().build(&nodes).unwrap();
        assert_eq!(report.forest.roots().len(), 1);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].members, vec![NodeId::from(1)]);
    }

    #[test]
    fn given_cycle_below_root_when_building_then_keeps_root_intact() {
        // r is a clean root; x -> y -> z -> x hangs off nothing
        let nodes = vec![
            CurriculumNode::new("r", "Root", NodeType::Subject),
            CurriculumNode::new("y", "Y", NodeType::Unit).with_parent("x"),
            CurriculumNode::new("x", "X", NodeType::Unit).with_parent("z"),
            CurriculumNode::new("z", "Z", NodeType::Unit).with_parent("y"),
        ];
        let report = TreeBuilder::new().build(&nodes).unwrap();
        assert_eq!(report.forest.len(), 4);
        assert_eq!(report.cycles.len(), 1);
        // walk starts at y (first in input), y -> x -> z -> y revisits y
        assert_eq!(report.cycles[0].promoted, NodeId::from("y"));
        assert_eq!(
            names(&report.forest, report.forest.roots()),
            vec!["Root".to_string(), "Y".to_string()]
        );
        assert_eq!(report.forest.depth(), 3);
    }

    #[test]
    fn given_tail_leading_into_cycle_when_building_then_tail_stays_attached() {
        // t -> a -> b -> a
        let nodes = vec![
            CurriculumNode::new("t", "Tail", NodeType::Topic).with_parent("a"),
            CurriculumNode::new("a", "A", NodeType::Unit).with_parent("b"),
            CurriculumNode::new("b", "B", NodeType::Unit).with_parent("a"),
        ];
        let report = TreeBuilder::new().build(&nodes).unwrap();
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].promoted, NodeId::from("a"));
        assert_eq!(
            report.cycles[0].members,
            vec![NodeId::from("a"), NodeId::from("b")]
        );
        assert_eq!(
            report.forest.ancestors(&"t".into()),
            vec![NodeId::from("a")]
        );
    }

    #[test]
    fn given_duplicate_ids_when_building_then_rejects() {
        let nodes = vec![
            CurriculumNode::new(1, "Math", NodeType::Subject),
            CurriculumNode::new(1, "Science", NodeType::Subject),
        ];
        assert_eq!(
            TreeBuilder::new().build(&nodes).err(),
            Some(DomainError::DuplicateId(NodeId::from(1)))
        );
    }

    #[test]
    fn given_blank_id_when_building_then_fails_with_record_index() {
        let nodes = vec![
            CurriculumNode::new(1, "Math", NodeType::Subject),
            CurriculumNode::new(" ", "Nameless", NodeType::Unit).with_parent(1),
        ];
        assert_eq!(
            TreeBuilder::new().build(&nodes).err(),
            Some(DomainError::MissingId { index: 1 })
        );
    }

    #[test]
    fn given_reused_builder_when_building_twice_then_state_is_reset() {
        let mut builder = TreeBuilder::new();
        let first = vec![
            CurriculumNode::new("a", "A", NodeType::Unit).with_parent("b"),
            CurriculumNode::new("b", "B", NodeType::Unit).with_parent("a"),
        ];
        assert_eq!(builder.build(&first).unwrap().cycles.len(), 1);

        let second = vec![CurriculumNode::new("c", "C", NodeType::Unit)];
        let report = builder.build(&second).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.forest.len(), 1);
    }

    #[test]
    fn given_cycle_warning_when_displaying_then_names_members() {
        let warning = CycleWarning {
            promoted: "x".into(),
            members: vec!["x".into(), "y".into()],
        };
        assert_eq!(warning.to_string(), "cycle x -> y -> x broken at x");
    }
}
