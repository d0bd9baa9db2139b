//! Navigation, traversal and predicate search
//!
//! Every search runs in pre-order: a node is visited before its children,
//! children left to right, each child's subtree before the next child. All
//! lookups return `None` or an empty [`Matched`] on a miss or a stale handle.

use serde_json::Value;

use crate::domain::collection::Collection;
use crate::domain::entities::{CollectionId, NodeId};
use crate::domain::factory::{NodeFactory, Sequence};
use crate::domain::matched::Matched;
use crate::domain::predicate::Predicate;
use crate::domain::tree::Tree;

/// Pre-order iterator over a node and its descendants.
pub struct PreOrder<'a, F: NodeFactory> {
    tree: &'a Tree<F>,
    stack: Vec<NodeId>,
}

impl<'a, F: NodeFactory> PreOrder<'a, F> {
    fn new(tree: &'a Tree<F>, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<F: NodeFactory> Iterator for PreOrder<'_, F> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(entry) = self.tree.entry(current) {
                // Push children in reverse order for left-to-right traversal
                for index in (0..entry.children.len()).rev() {
                    if let Some(child) = entry.children.at(index) {
                        self.stack.push(child);
                    }
                }
                return Some(current);
            }
        }
        None
    }
}

/// Iterator over the strict ancestors of a node, nearest first.
pub struct Ancestors<'a, F: NodeFactory> {
    tree: &'a Tree<F>,
    current: Option<NodeId>,
}

impl<F: NodeFactory> Iterator for Ancestors<'_, F> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.tree.parent(self.current?);
        self.current = parent;
        parent
    }
}

impl<F: NodeFactory> Tree<F> {
    // ------------------------------------------------------------
    // position
    // ------------------------------------------------------------

    /// Owning node of `node`'s parent collection.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_collection(node)?.owner()
    }

    /// True iff `node` is live and has no owning node.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.contains_node(node) && self.parent(node).is_none()
    }

    /// True iff `node` is an immediate child of a root.
    pub fn is_root_branch(&self, node: NodeId) -> bool {
        self.parent(node).is_some_and(|parent| self.is_root(parent))
    }

    /// Walk parent links up to the root of `node`'s tree. O(depth).
    pub fn root_of(&self, node: NodeId) -> Option<NodeId> {
        if !self.contains_node(node) {
            return None;
        }
        self.ancestors(node).last().or(Some(node))
    }

    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_, F> {
        Ancestors {
            tree: self,
            current: Some(node),
        }
    }

    /// Position within the parent's children; `None` for a root.
    pub fn index(&self, node: NodeId) -> Option<usize> {
        let collection = self.parent_collection(node)?;
        collection.owner()?;
        self.sequence(collection)?.index_of(node)
    }

    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index(node)?;
        self.entry(parent)?.children.at(index + 1)
    }

    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index(node)?.checked_sub(1)?;
        self.entry(parent)?.children.at(index)
    }

    /// Child collection of `node`, or `None` when it has no children.
    ///
    /// An empty collection and no collection are the same observable state.
    pub fn nodes(&self, node: NodeId) -> Option<Collection<'_, F>> {
        self.children(node).filter(|children| !children.is_empty())
    }

    /// Child collection of `node`, empty or not.
    pub fn children(&self, node: NodeId) -> Option<Collection<'_, F>> {
        self.collection(CollectionId::Children(node))
    }

    pub fn collection(&self, collection: CollectionId) -> Option<Collection<'_, F>> {
        self.sequence(collection)?;
        Some(Collection::new(self, collection))
    }

    /// The collection holding independent roots.
    pub fn top_level(&self) -> Collection<'_, F> {
        Collection::new(self, CollectionId::TopLevel)
    }

    /// True iff `other` is a strict descendant of `node`.
    pub fn contains(&self, node: NodeId, other: NodeId) -> bool {
        self.contains_node(node) && self.leap(other, |ancestor| ancestor != node).is_some()
    }

    // ------------------------------------------------------------
    // traversal
    // ------------------------------------------------------------

    /// Pre-order iterator over `node` and its descendants.
    pub fn iter_from(&self, node: NodeId) -> PreOrder<'_, F> {
        PreOrder::new(self, node)
    }

    /// Visit `node` and its descendants in pre-order until `visit` returns
    /// `false`; that node is returned. `None` if every visit returned `true`.
    pub fn walk(&self, node: NodeId, mut visit: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
        self.iter_from(node).find(|&current| !visit(current))
    }

    /// Visit the strict ancestors of `node`, nearest first, until `visit`
    /// returns `false`; that ancestor is returned.
    pub fn leap(&self, node: NodeId, mut visit: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
        self.ancestors(node).find(|&ancestor| !visit(ancestor))
    }

    /// `node` followed by all its descendants in pre-order.
    pub fn flatten(&self, node: NodeId) -> Matched {
        self.iter_from(node).collect()
    }

    /// Alias of [`Tree::flatten`].
    pub fn to_array(&self, node: NodeId) -> Matched {
        self.flatten(node)
    }

    /// Height of the subtree rooted at `node` (a leaf has depth 1).
    pub fn depth(&self, node: NodeId) -> usize {
        if !self.contains_node(node) {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(node, 1)];
        while let Some((current, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(
                self.child_ids(current)
                    .into_iter()
                    .map(|child| (child, level + 1)),
            );
        }
        deepest
    }

    /// Nodes without children under (and including) `node`, in pre-order.
    pub fn leaf_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.iter_from(node)
            .filter(|&current| {
                self.entry(current)
                    .is_some_and(|entry| entry.children.is_empty())
            })
            .collect()
    }

    // ------------------------------------------------------------
    // search
    // ------------------------------------------------------------

    /// True iff `node`'s own attributes satisfy `predicate`.
    pub fn matches(&self, node: NodeId, predicate: &Predicate) -> bool {
        self.entry(node)
            .is_some_and(|entry| predicate.matches(&entry.attributes))
    }

    /// First self-or-descendant whose id attribute equals `id`.
    pub fn find(&self, node: NodeId, id: impl Into<Value>) -> Option<NodeId> {
        let predicate = Predicate::new().with(self.config.id_key.clone(), id);
        self.find_where(node, &predicate)
    }

    /// Alias of [`Tree::find`].
    pub fn find_by_id(&self, node: NodeId, id: impl Into<Value>) -> Option<NodeId> {
        self.find(node, id)
    }

    /// First self-or-descendant matching `predicate`, in pre-order. Stops at
    /// the first match.
    pub fn find_where(&self, node: NodeId, predicate: &Predicate) -> Option<NodeId> {
        self.walk(node, |current| !self.matches(current, predicate))
    }

    /// Every self-or-descendant matching `predicate`, in pre-order.
    pub fn select(&self, node: NodeId, predicate: &Predicate) -> Matched {
        self.iter_from(node)
            .filter(|&current| self.matches(current, predicate))
            .collect()
    }

    /// Own value of `name`, else the nearest ancestor's.
    pub fn get_closest_ancestor_property(&self, node: NodeId, name: &str) -> Option<&Value> {
        if let Some(value) = self.get(node, name) {
            return Some(value);
        }
        let holder = self.leap(node, |ancestor| self.get(ancestor, name).is_none())?;
        self.get(holder, name)
    }
}
