//! Query results that can be queried again

use itertools::Itertools;
use serde_json::Value;

use crate::domain::entities::NodeId;
use crate::domain::factory::NodeFactory;
use crate::domain::predicate::Predicate;
use crate::domain::tree::Tree;

/// Ordered, de-duplicated list of node handles produced by a query.
///
/// Non-owning: the handles go stale if the nodes are removed later.
/// Chaining [`Matched::select`] queries the subtrees of every contained node,
/// so `tree.select(root, &a).select(&tree, &b)` reads as "nodes matching `b`
/// below any node matching `a`".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matched(Vec<NodeId>);

impl Matched {
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        nodes.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.0.get(index).copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.0.last().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.0
    }

    /// Union of every contained node's own [`Tree::select`], first
    /// occurrence wins.
    pub fn select<F: NodeFactory>(&self, tree: &Tree<F>, predicate: &Predicate) -> Matched {
        self.iter()
            .flat_map(|node| tree.select(node, predicate))
            .collect()
    }

    /// Union of every contained node's id lookup.
    pub fn find_by_id<F: NodeFactory>(&self, tree: &Tree<F>, id: impl Into<Value>) -> Matched {
        let id = id.into();
        self.iter()
            .filter_map(|node| tree.find(node, id.clone()))
            .collect()
    }
}

impl FromIterator<NodeId> for Matched {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().unique().collect())
    }
}

impl IntoIterator for Matched {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Matched {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Matched> for Vec<NodeId> {
    fn from(matched: Matched) -> Self {
        matched.0
    }
}
