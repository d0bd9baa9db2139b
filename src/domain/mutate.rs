//! Structural mutation: add, move, insert, remove, empty
//!
//! Inserting an existing node moves it: the node is detached from its
//! current collection (firing `remove` there) before it is linked into the
//! new one (firing `add`). Bulk inputs are validated up front; a failure while
//! building records part way through a bulk insert is not rolled back.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::entities::{Adjacent, CollectionId, NodeId, NodeInput};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::events::{EventKind, TreeEvent};
use crate::domain::factory::{NodeFactory, Sequence};
use crate::domain::predicate::Predicate;
use crate::domain::tree::Tree;

#[derive(Debug, Clone, Copy)]
enum Position {
    End,
    At(usize),
    Before(NodeId),
    After(NodeId),
}

impl<F: NodeFactory> Tree<F> {
    /// Append records and/or existing nodes to `node`'s children.
    ///
    /// Returns the ids of the inserted nodes in order.
    pub fn add(&mut self, node: NodeId, input: impl Into<NodeInput>) -> TreeResult<Vec<NodeId>> {
        self.insert_at(CollectionId::Children(node), input.into(), Position::End)
    }

    /// Insert into any collection, at `index` or at the end.
    pub fn insert_into(
        &mut self,
        collection: CollectionId,
        input: impl Into<NodeInput>,
        index: Option<usize>,
    ) -> TreeResult<Vec<NodeId>> {
        let position = index.map_or(Position::End, Position::At);
        self.insert_at(collection, input.into(), position)
    }

    /// Insert `input` as left siblings of `node`, keeping input order.
    ///
    /// No-op returning an empty list when `node` is a root.
    pub fn insert_before(
        &mut self,
        node: NodeId,
        input: impl Into<NodeInput>,
    ) -> TreeResult<Vec<NodeId>> {
        self.insert_beside(node, input.into(), Position::Before(node))
    }

    /// Insert `input` as right siblings of `node`, keeping input order.
    ///
    /// No-op returning an empty list when `node` is a root.
    pub fn insert_after(
        &mut self,
        node: NodeId,
        input: impl Into<NodeInput>,
    ) -> TreeResult<Vec<NodeId>> {
        self.insert_beside(node, input.into(), Position::After(node))
    }

    /// Without `input`: the previous sibling. With `input`: [`Tree::insert_before`].
    pub fn before(&mut self, node: NodeId, input: Option<NodeInput>) -> TreeResult<Adjacent> {
        match input {
            None => Ok(Adjacent::Sibling(self.prev(node))),
            Some(input) => self.insert_before(node, input).map(Adjacent::Inserted),
        }
    }

    /// Without `input`: the next sibling. With `input`: [`Tree::insert_after`].
    pub fn after(&mut self, node: NodeId, input: Option<NodeInput>) -> TreeResult<Adjacent> {
        match input {
            None => Ok(Adjacent::Sibling(self.next(node))),
            Some(input) => self.insert_after(node, input).map(Adjacent::Inserted),
        }
    }

    /// Remove `node` from its parent and destroy its subtree.
    ///
    /// A root cannot be removed: returns `false` and leaves the tree as is.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.contains_node(node) || self.is_root(node) {
            return false;
        }
        self.detach(node);
        let freed = self.destroy(node);
        debug!(%node, freed, "removed node");
        true
    }

    /// Remove the first (or every) strict descendant of `node` matching
    /// `predicate`. Returns how many matches were removed; a match nested in
    /// an already removed match is gone with it and not counted.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_where(&mut self, node: NodeId, predicate: &Predicate, first_only: bool) -> usize {
        let targets: Vec<NodeId> = {
            let mut candidates = self
                .iter_from(node)
                .skip(1)
                .filter(|&current| self.matches(current, predicate));
            if first_only {
                candidates.next().into_iter().collect()
            } else {
                candidates.collect()
            }
        };
        targets
            .into_iter()
            .filter(|&target| self.remove(target))
            .count()
    }

    /// Remove a member of `collection` and destroy its subtree.
    ///
    /// Unlike [`Tree::remove`] this also removes roots held by the top-level
    /// collection. Returns `false` if `node` is not a member.
    pub fn remove_from(&mut self, collection: CollectionId, node: NodeId) -> bool {
        if self.parent_collection(node) != Some(collection) {
            return false;
        }
        self.detach(node);
        self.destroy(node);
        true
    }

    /// Destroy a detached node built with [`Tree::create`] that was never
    /// added anywhere.
    pub fn discard(&mut self, node: NodeId) -> bool {
        if !self.contains_node(node) || self.parent_collection(node).is_some() {
            return false;
        }
        self.destroy(node);
        true
    }

    /// Clear `node`'s children, destroying every descendant.
    pub fn empty(&mut self, node: NodeId) -> TreeResult<usize> {
        self.reset(CollectionId::Children(node))
    }

    /// Clear a collection, destroying every member subtree. Fires `reset`.
    ///
    /// Returns the number of destroyed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self, collection: CollectionId) -> TreeResult<usize> {
        let sequence = self
            .sequence_mut(collection)
            .ok_or_else(|| Self::missing_owner(collection))?;
        let members = sequence.clear();
        let mut freed = 0;
        for member in members {
            if let Some(entry) = self.entry_mut(member) {
                entry.parent = None;
            }
            freed += self.destroy(member);
        }
        self.dispatch(
            None,
            Some(collection),
            TreeEvent::new(EventKind::Reset, collection.owner()).in_collection(collection),
        );
        debug!(?collection, freed, "reset collection");
        Ok(freed)
    }

    /// Set every attribute of `attributes` on `node` and all its descendants.
    pub fn set_prop_descendants(&mut self, node: NodeId, attributes: Value) -> TreeResult<()> {
        let Value::Object(attributes) = attributes else {
            return Err(TreeError::structure("attributes must be an object"));
        };
        if !self.contains_node(node) {
            return Err(TreeError::NodeNotFound(node));
        }
        for target in self.flatten(node) {
            for (name, value) in &attributes {
                self.set(target, name, value.clone())?;
            }
        }
        Ok(())
    }

    fn insert_beside(
        &mut self,
        node: NodeId,
        input: NodeInput,
        position: Position,
    ) -> TreeResult<Vec<NodeId>> {
        if !self.contains_node(node) {
            return Err(TreeError::NodeNotFound(node));
        }
        if self.is_root(node) {
            debug!(%node, "insert beside a root ignored");
            return Ok(Vec::new());
        }
        let collection = self
            .parent_collection(node)
            .ok_or(TreeError::NodeNotFound(node))?;
        self.insert_at(collection, input, position)
    }

    fn insert_at(
        &mut self,
        collection: CollectionId,
        input: NodeInput,
        position: Position,
    ) -> TreeResult<Vec<NodeId>> {
        if self.sequence(collection).is_none() {
            return Err(Self::missing_owner(collection));
        }
        let items = input.into_items();
        for item in &items {
            self.check_insertable(item, collection)?;
        }

        let mut inserted = Vec::with_capacity(items.len());
        let mut cursor = position;
        for item in items {
            let node = match item {
                NodeInput::Node(node) => {
                    if matches!(cursor, Position::Before(anchor) | Position::After(anchor) if anchor == node)
                    {
                        continue;
                    }
                    self.detach(node);
                    node
                }
                NodeInput::Record(record) => self.build_record(record)?,
                NodeInput::Many(_) => continue,
            };
            let index = self.resolve_index(collection, cursor);
            self.link(node, collection, index);
            debug!(%node, ?collection, index, "inserted node");
            self.dispatch(
                Some(node),
                Some(collection),
                TreeEvent::new(EventKind::Add, Some(node)).in_collection(collection),
            );
            cursor = match cursor {
                Position::At(index) => Position::At(index + 1),
                Position::After(_) => Position::After(node),
                other => other,
            };
            inserted.push(node);
        }
        Ok(inserted)
    }

    fn check_insertable(&self, item: &NodeInput, collection: CollectionId) -> TreeResult<()> {
        match item {
            NodeInput::Node(node) => {
                if !self.contains_node(*node) {
                    return Err(TreeError::NodeNotFound(*node));
                }
                if let Some(target) = collection.owner() {
                    if *node == target || self.contains(*node, target) {
                        return Err(TreeError::CycleDetected {
                            node: *node,
                            target,
                        });
                    }
                }
                Ok(())
            }
            NodeInput::Record(record) => self.validate_record(record),
            NodeInput::Many(items) => items
                .iter()
                .try_for_each(|item| self.check_insertable(item, collection)),
        }
    }

    fn resolve_index(&self, collection: CollectionId, position: Position) -> usize {
        let Some(sequence) = self.sequence(collection) else {
            return usize::MAX;
        };
        match position {
            Position::End => usize::MAX,
            Position::At(index) => index,
            Position::Before(anchor) => sequence.index_of(anchor).unwrap_or(usize::MAX),
            Position::After(anchor) => sequence
                .index_of(anchor)
                .map_or(usize::MAX, |index| index + 1),
        }
    }

    fn missing_owner(collection: CollectionId) -> TreeError {
        match collection.owner() {
            Some(owner) => TreeError::NodeNotFound(owner),
            None => TreeError::structure("top-level collection unavailable"),
        }
    }
}
