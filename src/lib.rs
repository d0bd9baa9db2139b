//! treemodel: nested JSON records as a navigable, mutable tree
//!
//! The [`domain`] layer holds the tree engine (arena storage, traversal,
//! predicate queries, mutation with event bubbling). The outer layers load
//! documents from disk and expose them through the `treemodel` binary.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    Collection, CollectionId, Matched, NodeId, Predicate, Tree, TreeConfig, TreeError,
    TreeEvent, TreeResult,
};
