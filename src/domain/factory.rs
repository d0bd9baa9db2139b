//! Substrate seams: attribute store, ordered sequence, and the node factory
//!
//! Every node and every child collection of a [`Tree`](crate::domain::Tree)
//! is built through the [`NodeFactory`] the tree was created with, so a
//! customised tree produces customised descendants all the way down.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::domain::entities::NodeId;

/// Keyed attribute storage of a single node.
pub trait AttributeStore {
    fn get(&self, name: &str) -> Option<&Value>;

    /// Store `value`, returning the previous value if there was one.
    fn set(&mut self, name: &str, value: Value) -> Option<Value>;

    fn unset(&mut self, name: &str) -> Option<Value>;

    /// Current attribute snapshot, used for matching and serialization.
    fn attributes(&self) -> &Map<String, Value>;
}

/// Default attribute store backed by a JSON object map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl AttributeStore for Attributes {
    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.0.insert(name.to_string(), value)
    }

    fn unset(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Ordered, mutable container of sibling handles.
///
/// Insertion order is sibling order.
pub trait Sequence: Default {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn at(&self, index: usize) -> Option<NodeId>;

    fn index_of(&self, item: NodeId) -> Option<usize>;

    /// Insert at `index`; an index past the end appends.
    fn insert(&mut self, index: usize, item: NodeId);

    /// Remove `item`, returning the position it held.
    fn remove_item(&mut self, item: NodeId) -> Option<usize>;

    /// Empty the sequence, returning the former members in order.
    fn clear(&mut self) -> Vec<NodeId>;

    fn to_vec(&self) -> Vec<NodeId> {
        (0..self.len()).filter_map(|i| self.at(i)).collect()
    }
}

impl Sequence for Vec<NodeId> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn at(&self, index: usize) -> Option<NodeId> {
        self.get(index).copied()
    }

    fn index_of(&self, item: NodeId) -> Option<usize> {
        self.iter().position(|&n| n == item)
    }

    fn insert(&mut self, index: usize, item: NodeId) {
        let index = index.min(Vec::len(self));
        Vec::insert(self, index, item);
    }

    fn remove_item(&mut self, item: NodeId) -> Option<usize> {
        let index = Sequence::index_of(self, item)?;
        self.remove(index);
        Some(index)
    }

    fn clear(&mut self) -> Vec<NodeId> {
        std::mem::take(self)
    }

    fn to_vec(&self) -> Vec<NodeId> {
        self.clone()
    }
}

impl Sequence for VecDeque<NodeId> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn at(&self, index: usize) -> Option<NodeId> {
        self.get(index).copied()
    }

    fn index_of(&self, item: NodeId) -> Option<usize> {
        self.iter().position(|&n| n == item)
    }

    fn insert(&mut self, index: usize, item: NodeId) {
        let index = index.min(VecDeque::len(self));
        VecDeque::insert(self, index, item);
    }

    fn remove_item(&mut self, item: NodeId) -> Option<usize> {
        let index = Sequence::index_of(self, item)?;
        self.remove(index);
        Some(index)
    }

    fn clear(&mut self) -> Vec<NodeId> {
        self.drain(..).collect()
    }
}

/// Builds the per-node substrate: one attribute store and one child sequence
/// for every node of a tree.
pub trait NodeFactory {
    type Store: AttributeStore;
    type Children: Sequence;

    fn create_store(&self, attributes: Map<String, Value>) -> Self::Store;

    fn create_children(&self) -> Self::Children {
        Self::Children::default()
    }
}

/// Factory used by [`Tree::new`](crate::domain::Tree::new).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl NodeFactory for DefaultFactory {
    type Store = Attributes;
    type Children = Vec<NodeId>;

    fn create_store(&self, attributes: Map<String, Value>) -> Attributes {
        Attributes::new(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generational_arena::Index;

    fn id(slot: usize) -> NodeId {
        NodeId(Index::from_raw_parts(slot, 0))
    }

    #[test]
    fn test_vec_sequence_insert_clamps_to_end() {
        let mut seq: Vec<NodeId> = Vec::new();
        Sequence::insert(&mut seq, 5, id(1));
        Sequence::insert(&mut seq, 0, id(2));
        assert_eq!(seq.to_vec(), vec![id(2), id(1)]);
        assert_eq!(Sequence::index_of(&seq, id(1)), Some(1));
    }

    #[test]
    fn test_deque_sequence_remove_reports_position() {
        let mut seq: VecDeque<NodeId> = VecDeque::new();
        for slot in 0..3 {
            Sequence::insert(&mut seq, slot, id(slot));
        }
        assert_eq!(seq.remove_item(id(1)), Some(1));
        assert_eq!(seq.remove_item(id(1)), None);
        assert_eq!(Sequence::clear(&mut seq), vec![id(0), id(2)]);
        assert!(Sequence::is_empty(&seq));
    }

    #[test]
    fn test_attributes_set_returns_previous() {
        let mut attrs = Attributes::default();
        assert_eq!(attrs.set("width", Value::from(300)), None);
        assert_eq!(attrs.set("width", Value::from(600)), Some(Value::from(300)));
        assert_eq!(attrs.get("width"), Some(&Value::from(600)));
        assert_eq!(attrs.unset("width"), Some(Value::from(600)));
        assert!(attrs.attributes().is_empty());
    }
}
