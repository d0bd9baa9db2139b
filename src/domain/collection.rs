//! Read-only view of an ordered sibling collection
//!
//! Mutations go through [`Tree::insert_into`], [`Tree::remove_from`] and
//! [`Tree::reset`] since they need the tree mutably.

use serde_json::Value;

use crate::domain::entities::{CollectionId, NodeId};
use crate::domain::factory::{NodeFactory, Sequence};
use crate::domain::matched::Matched;
use crate::domain::predicate::Predicate;
use crate::domain::tree::Tree;

/// Borrowed view of one collection of a [`Tree`].
pub struct Collection<'a, F: NodeFactory> {
    tree: &'a Tree<F>,
    id: CollectionId,
}

impl<F: NodeFactory> Clone for Collection<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: NodeFactory> Copy for Collection<'_, F> {}

impl<F: NodeFactory> std::fmt::Debug for Collection<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("members", &self.to_vec())
            .finish()
    }
}

impl<'a, F: NodeFactory> Collection<'a, F> {
    pub(crate) fn new(tree: &'a Tree<F>, id: CollectionId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Owning node; `None` for the top-level collection.
    pub fn owner(&self) -> Option<NodeId> {
        self.id.owner()
    }

    fn sequence(&self) -> Option<&'a F::Children> {
        self.tree.sequence(self.id)
    }

    pub fn len(&self) -> usize {
        self.sequence().map_or(0, |sequence| sequence.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, index: usize) -> Option<NodeId> {
        self.sequence()?.at(index)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.at(0)
    }

    pub fn last(&self) -> Option<NodeId> {
        self.len().checked_sub(1).and_then(|index| self.at(index))
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.sequence()?.index_of(node)
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.sequence().map(Sequence::to_vec).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + 'a {
        let collection = *self;
        (0..self.len()).filter_map(move |index| collection.at(index))
    }

    /// Members matching `predicate`; with `deep`, every member's own
    /// [`Tree::select`] concatenated and de-duplicated.
    pub fn select(&self, predicate: &Predicate, deep: bool) -> Matched {
        if deep {
            self.iter()
                .flat_map(|member| self.tree.select(member, predicate))
                .collect()
        } else {
            self.iter()
                .filter(|&member| self.tree.matches(member, predicate))
                .collect()
        }
    }

    /// First node in pre-order, across all members' subtrees, whose id
    /// attribute equals `id`.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Option<NodeId> {
        let id = id.into();
        self.iter()
            .find_map(|member| self.tree.find(member, id.clone()))
    }

    /// First node in pre-order across all members matching `predicate`.
    pub fn find_where(&self, predicate: &Predicate) -> Option<NodeId> {
        self.iter()
            .find_map(|member| self.tree.find_where(member, predicate))
    }

    /// Pre-order over every member's subtree; stops the whole walk at the
    /// first node for which `visit` returns `false` and yields it.
    pub fn walk(&self, mut visit: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
        self.iter()
            .find_map(|member| self.tree.walk(member, &mut visit))
    }

    /// Concatenation of each member's [`Tree::flatten`].
    pub fn flatten(&self) -> Matched {
        self.iter()
            .flat_map(|member| self.tree.flatten(member))
            .collect()
    }

    /// Array of every member serialized with [`Tree::to_json`].
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.iter()
                .filter_map(|member| self.tree.to_json(member))
                .collect(),
        )
    }
}

impl<'a, F: NodeFactory> IntoIterator for Collection<'a, F> {
    type Item = NodeId;
    type IntoIter = Box<dyn Iterator<Item = NodeId> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
