//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Query and edit nested JSON record trees
#[derive(Parser, Debug)]
#[command(name = "treemodel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Emit JSON instead of labels
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the document as a tree of node labels
    Show {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the node with the given id
    Find {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Value of the id attribute
        id: String,
    },

    /// List nodes whose attributes match every key=value pair
    Select {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Attribute filters of the first stage
        #[arg(required = true)]
        filters: Vec<String>,
        /// Further stage matched below the previous result (comma separated)
        #[arg(long = "then", value_name = "KEY=VALUE,...")]
        then: Vec<String>,
        /// Start below this node instead of the top-level records
        #[arg(long, value_name = "ID")]
        from: Option<String>,
        /// Match the first stage in whole subtrees, not just top-level records
        #[arg(long)]
        deep: bool,
    },

    /// List every node in pre-order
    Flatten {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Start at this node
        #[arg(long, value_name = "ID")]
        from: Option<String>,
    },

    /// Move a node under a new parent (or next to a sibling)
    Move {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node to move
        node: String,
        /// New parent, or the sibling with --before/--after
        target: String,
        /// Insert as the left sibling of TARGET
        #[arg(long, conflicts_with = "after")]
        before: bool,
        /// Insert as the right sibling of TARGET
        #[arg(long)]
        after: bool,
    },

    /// Remove a node and its subtree
    Remove {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node to remove
        id: String,
    },

    /// Set attributes on a node
    Set {
        /// JSON document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node to change
        id: String,
        /// Attributes to set
        #[arg(required = true)]
        assignments: Vec<String>,
        /// Also set them on every descendant
        #[arg(long)]
        descendants: bool,
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
    /// Show effective settings
    Show {
        /// Directory whose .treemodel.toml is applied
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
    /// Show config file locations
    Path,
}
