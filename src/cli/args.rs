//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::Role;

/// Curriculum hierarchy manager: build, inspect and render curriculum node trees
#[derive(Parser, Debug)]
#[command(name = "currtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Act as this role: admin, teacher or student (default: from config)
    #[arg(long, global = true)]
    pub role: Option<Role>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the curriculum as a collapsible tree
    Tree {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Highlight this node and open its ancestors
        #[arg(short, long)]
        select: Option<String>,
        /// Open the first N levels (default: from config)
        #[arg(short, long)]
        levels: Option<usize>,
        /// Also expand these nodes
        #[arg(short, long)]
        expand: Vec<String>,
        /// Restore expansion from a saved state file
        #[arg(long, value_hint = ValueHint::FilePath)]
        state: Option<PathBuf>,
        /// Expand everything
        #[arg(short, long, conflicts_with_all = ["levels", "state"])]
        all: bool,
    },

    /// Print the ancestors of a node, root first
    Path {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Node id
        id: String,
    },

    /// Validate node files and report orphans and cycles
    Check {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Fail if any hierarchy defect had to be repaired
        #[arg(long)]
        strict: bool,
    },

    /// Expand or collapse one node in the saved view state
    Toggle {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Node id
        id: String,
        /// State file (default: from config)
        #[arg(long, value_hint = ValueHint::FilePath)]
        state: Option<PathBuf>,
    },

    /// Pick a node interactively (fzf) and show it in the tree
    Select {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },

    /// Move a node under a new parent
    Move {
        /// Node file or directory of node files
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Node to move
        id: String,
        /// New parent id
        #[arg(short, long, required_unless_present = "root", conflicts_with = "root")]
        parent: Option<String>,
        /// Make the node a root
        #[arg(long)]
        root: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Curriculum directory whose local config is included
        dir: Option<PathBuf>,
    },

    /// Create config template
    Init {
        /// Create the local config in this curriculum directory instead of the global one
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// Show config paths
    Path,
}
