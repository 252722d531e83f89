//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod expansion;

pub use arena::{Forest, TreeEntry};
pub use builder::{build_tree, BuildReport, CycleWarning, TreeBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use expansion::{compute_expansion_path, ExpansionState};
