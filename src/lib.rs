//! currtree: curriculum hierarchy manager.
//!
//! Curriculum nodes (subjects, units, topics, lessons) are flat records that
//! point at their parent. This crate assembles them into a forest, repairs
//! dangling parents and parent cycles, computes which branches must be open
//! to reveal a selected node, and renders the result as a collapsible tree.
//!
//! Layers, innermost first:
//! - [`domain`]: node model, arena forest, builder, expansion state
//! - [`application`]: services, access policy, tree rendering
//! - [`infrastructure`]: TOML node files, filesystem, interactive selector
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    build_tree, compute_expansion_path, CurriculumNode, ExpansionState, Forest, NodeId, NodeType,
};
