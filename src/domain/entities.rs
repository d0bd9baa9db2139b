//! Domain entities: handles and value types shared by the tree modules

use std::fmt;

use generational_arena::Index;
use serde_json::Value;

/// Generational handle of a node living in a [`Tree`](crate::domain::Tree).
///
/// Handles are cheap to copy. Once the node is destroyed the handle goes
/// stale: queries treat it as absent and mutations report
/// [`TreeError::NodeNotFound`](crate::domain::TreeError::NodeNotFound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}v{generation}")
    }
}

/// Identifies an ordered sibling collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionId {
    /// Holder of independent root nodes; has no owner.
    TopLevel,
    /// The child collection owned by a node.
    Children(NodeId),
}

impl CollectionId {
    /// The node owning this collection, `None` for the top-level holder.
    pub fn owner(self) -> Option<NodeId> {
        match self {
            CollectionId::TopLevel => None,
            CollectionId::Children(owner) => Some(owner),
        }
    }
}

/// Names of the reserved keys in the nested record format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    /// Key introducing the nested list of child records
    pub children_key: String,
    /// Attribute used for identity lookup
    pub id_key: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            children_key: "children".into(),
            id_key: "id".into(),
        }
    }
}

/// Options for [`Tree::to_json_with`](crate::domain::Tree::to_json_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Serialize only the node's own attributes, without children
    pub shallow: bool,
}

impl JsonOptions {
    pub fn shallow() -> Self {
        Self { shallow: true }
    }
}

/// What to insert into a collection: existing nodes, records, or a mix.
///
/// A JSON array converts to a sequence of records; an existing node is moved,
/// never copied.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInput {
    Node(NodeId),
    Record(Value),
    Many(Vec<NodeInput>),
}

impl NodeInput {
    /// Flatten nested sequences into single-item inputs, keeping order.
    pub(crate) fn into_items(self) -> Vec<NodeInput> {
        let mut items = Vec::new();
        let mut pending = vec![self];
        while let Some(input) = pending.pop() {
            match input {
                NodeInput::Many(inputs) => pending.extend(inputs.into_iter().rev()),
                NodeInput::Record(Value::Array(records)) => {
                    pending.extend(records.into_iter().rev().map(NodeInput::Record))
                }
                single => items.push(single),
            }
        }
        items
    }
}

impl From<NodeId> for NodeInput {
    fn from(node: NodeId) -> Self {
        NodeInput::Node(node)
    }
}

impl From<Value> for NodeInput {
    fn from(record: Value) -> Self {
        NodeInput::Record(record)
    }
}

impl From<Vec<NodeId>> for NodeInput {
    fn from(nodes: Vec<NodeId>) -> Self {
        NodeInput::Many(nodes.into_iter().map(NodeInput::Node).collect())
    }
}

impl From<Vec<Value>> for NodeInput {
    fn from(records: Vec<Value>) -> Self {
        NodeInput::Many(records.into_iter().map(NodeInput::Record).collect())
    }
}

/// Result of [`Tree::before`](crate::domain::Tree::before) and
/// [`Tree::after`](crate::domain::Tree::after).
///
/// Without an argument those calls are sibling queries; with one they insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjacent {
    /// Query form: the neighbouring sibling, if any
    Sibling(Option<NodeId>),
    /// Mutation form: ids of the inserted nodes (empty for a root anchor)
    Inserted(Vec<NodeId>),
}
