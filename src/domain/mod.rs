//! Domain layer: the tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod collection;
pub mod entities;
pub mod error;
pub mod events;
pub mod factory;
pub mod matched;
mod mutate;
pub mod predicate;
pub mod query;
mod render;
mod serialize;
pub mod tree;

pub use collection::Collection;
pub use entities::{Adjacent, CollectionId, JsonOptions, NodeId, NodeInput, TreeConfig};
pub use error::{TreeError, TreeResult};
pub use events::{EventKind, ListenerId, TreeEvent, ALL, DESCENDANT_PREFIX};
pub use factory::{AttributeStore, Attributes, DefaultFactory, NodeFactory, Sequence};
pub use matched::Matched;
pub use predicate::Predicate;
pub use query::{Ancestors, PreOrder};
pub use tree::Tree;
