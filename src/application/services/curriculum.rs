//! Curriculum hierarchy service
//!
//! Loads nodes through the data source, checks access, builds the forest and
//! prepares the collapsible view.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::access::{AccessPolicy, Action, Role};
use crate::application::error_ext::FormatResultExt;
use crate::application::render::{render_forest, Row, TreeView};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{
    BuildReport, CurriculumNode, DomainError, ExpansionState, Forest, NodeId, TreeBuilder,
};
use crate::infrastructure::traits::{FileSystem, NodeSource, SelectionItem};

/// How the initial view should be opened.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// Node to highlight; its ancestors are always expanded
    pub selected: Option<NodeId>,
    /// Expand the first N levels when no saved state is given
    pub levels: usize,
    /// Additional nodes to expand
    pub expand: Vec<NodeId>,
    /// Previously saved state; replaces the level rule when present
    pub saved: Option<ExpansionState>,
    /// Expand every node with children
    pub expand_all: bool,
}

/// Result of flipping one node in the saved view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    /// Leaves have nothing to show or hide; the state is left as it was.
    Leaf,
}

/// Built forest together with the expansion state used to show it.
#[derive(Debug, Clone)]
pub struct CurriculumView {
    pub report: BuildReport,
    pub state: ExpansionState,
    pub selected: Option<NodeId>,
}

impl CurriculumView {
    pub fn forest(&self) -> &Forest {
        &self.report.forest
    }

    pub fn rows(&self) -> Vec<Row> {
        TreeView::new(&self.report.forest, &self.state, self.selected.as_ref()).rows()
    }

    pub fn render(&self, color: bool) -> String {
        render_forest(
            &self.report.forest,
            &self.state,
            self.selected.as_ref(),
            color,
        )
    }
}

/// Service for building and inspecting curriculum hierarchies.
pub struct CurriculumService {
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn NodeSource>,
    policy: Arc<dyn AccessPolicy>,
}

impl CurriculumService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn NodeSource>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self { fs, source, policy }
    }

    /// Load all nodes at `path` on behalf of `role`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, role: Role, path: &Path) -> ApplicationResult<Vec<CurriculumNode>> {
        self.policy.authorize(role, Action::View)?;
        let nodes = self.source.load(path)?;
        debug!("load: {} nodes from {}", nodes.len(), path.display());
        Ok(nodes)
    }

    /// Build the forest and the initial expansion state.
    #[instrument(level = "debug", skip(self, nodes, options), fields(nodes = nodes.len()))]
    pub fn view(
        &self,
        nodes: &[CurriculumNode],
        options: ViewOptions,
    ) -> ApplicationResult<CurriculumView> {
        let report = TreeBuilder::new().build(nodes)?;
        let forest = &report.forest;

        if let Some(id) = &options.selected {
            if !forest.contains(id) {
                return Err(DomainError::NodeNotFound(id.clone()).into());
            }
        }

        let mut state = if options.expand_all {
            ExpansionState::all(forest)
        } else {
            match options.saved {
                Some(mut saved) => {
                    saved.retain_known(forest);
                    saved
                }
                None => ExpansionState::expand_levels(forest, options.levels),
            }
        };
        if let Some(id) = &options.selected {
            state.merge(&ExpansionState::from_ids(forest.expansion_path(id)));
        }
        for id in options.expand {
            if forest.contains(&id) {
                state.expand(id);
            } else {
                debug!("view: ignoring unknown expand id {}", id);
            }
        }

        Ok(CurriculumView {
            report,
            state,
            selected: options.selected,
        })
    }

    /// Ancestor chain of `id` (root first) in the repaired hierarchy.
    pub fn expansion_path(
        &self,
        nodes: &[CurriculumNode],
        id: &NodeId,
    ) -> ApplicationResult<Vec<NodeId>> {
        let report = TreeBuilder::new().build(nodes)?;
        if !report.forest.contains(id) {
            return Err(DomainError::NodeNotFound(id.clone()).into());
        }
        Ok(report.forest.ancestors(id))
    }

    /// Build and return all repair diagnostics.
    pub fn check(&self, nodes: &[CurriculumNode]) -> ApplicationResult<BuildReport> {
        Ok(TreeBuilder::new().build(nodes)?)
    }

    /// Flip one node in the state saved at `state_file` and save it again.
    ///
    /// Without a saved state, the first `levels` levels are the starting point.
    /// Leaves are never recorded as expanded: toggling one only drops a stale
    /// entry for it, if any.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn toggle(
        &self,
        nodes: &[CurriculumNode],
        state_file: &Path,
        id: &NodeId,
        levels: usize,
    ) -> ApplicationResult<(ExpansionState, ToggleOutcome)> {
        let forest = TreeBuilder::new().build(nodes)?.forest;
        let entry = forest
            .entry(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.clone()))?;

        let saved = self.load_state(state_file)?;
        let mut state = saved
            .clone()
            .unwrap_or_else(|| ExpansionState::expand_levels(&forest, levels));
        state.retain_known(&forest);

        if entry.is_leaf() {
            if state.collapse(id) && saved.is_some() {
                self.save_state(state_file, &state)?;
            }
            debug!("toggle: {} is a leaf", id);
            return Ok((state, ToggleOutcome::Leaf));
        }

        let outcome = if state.toggle(id) {
            ToggleOutcome::Expanded
        } else {
            ToggleOutcome::Collapsed
        };
        self.save_state(state_file, &state)?;
        debug!("toggle: {} {:?}", id, outcome);
        Ok((state, outcome))
    }

    pub fn load_state(&self, state_file: &Path) -> ApplicationResult<Option<ExpansionState>> {
        if !self.fs.exists(state_file) {
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(state_file)
            .with_path_context("read view state", state_file)?;
        let state = toml::from_str(&content).with_format_context("parse view state", state_file)?;
        Ok(Some(state))
    }

    pub fn save_state(&self, state_file: &Path, state: &ExpansionState) -> ApplicationResult<()> {
        let content = toml::to_string(state).with_format_context("serialize view state", state_file)?;
        self.fs
            .ensure_parent(state_file)
            .with_path_context("create directory for", state_file)?;
        self.fs
            .write(state_file, &content)
            .with_path_context("write view state", state_file)
    }

    /// One picker item per node: breadcrumb display, node id as value.
    pub fn selection_items(&self, nodes: &[CurriculumNode]) -> ApplicationResult<Vec<SelectionItem>> {
        let forest = TreeBuilder::new().build(nodes)?.forest;
        let mut crumbs: Vec<&str> = Vec::new();
        let mut items = Vec::with_capacity(forest.len());
        for (depth, entry) in forest.iter() {
            crumbs.truncate(depth);
            crumbs.push(&entry.node.name);
            items.push(SelectionItem {
                display: format!(
                    "{}  [{}] #{}",
                    crumbs.join(" / "),
                    entry.node.node_type,
                    entry.id()
                ),
                value: entry.id().to_string(),
            });
        }
        Ok(items)
    }

    /// Move `id` under `parent`, or make it a root when `parent` is None.
    ///
    /// The file holding `id` is rewritten in place.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(
        &self,
        role: Role,
        path: &Path,
        id: &NodeId,
        parent: Option<&NodeId>,
    ) -> ApplicationResult<()> {
        self.policy.authorize(role, Action::Modify)?;

        let nodes = self.source.load(path)?;
        let forest = TreeBuilder::new().build(&nodes)?.forest;
        if !forest.contains(id) {
            return Err(DomainError::NodeNotFound(id.clone()).into());
        }
        if let Some(parent) = parent {
            if !forest.contains(parent) {
                return Err(DomainError::NodeNotFound(parent.clone()).into());
            }
            if parent == id || forest.is_ancestor(id, parent) {
                return Err(DomainError::WouldCreateCycle {
                    node: id.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
        }

        for file in self.source.files(path)? {
            let mut file_nodes = self.source.load_file(&file)?;
            if let Some(node) = file_nodes.iter_mut().find(|n| &n.id == id) {
                node.parent_id = parent.cloned();
                self.source.save_file(&file, &file_nodes)?;
                info!(
                    "reparent: {} -> {} in {}",
                    id,
                    parent.map(|p| p.to_string()).unwrap_or_else(|| "root".into()),
                    file.display()
                );
                return Ok(());
            }
        }
        Err(DomainError::NodeNotFound(id.clone()).into())
    }
}
