//! Arena-backed tree: storage, construction, and attribute access
//!
//! Nodes live in a generational arena and refer to each other by [`NodeId`].
//! Each node records the collection it currently lives in (its parent
//! collection) and owns the ordered sequence of its children; siblings are
//! derived from the parent's sequence, never stored.
//!
//! A `Tree` may hold several independent roots in its top-level collection
//! (see [`Tree::from_value`] with an array). Nodes being built or moved are
//! briefly detached (no parent collection at all) and are roots too.

use std::fmt;

use generational_arena::Arena;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use crate::domain::entities::{CollectionId, NodeId, TreeConfig};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::events::{EventKind, ListenerId, Listeners, TreeEvent};
use crate::domain::factory::{AttributeStore, DefaultFactory, NodeFactory, Sequence};

/// Storage slot of one node.
pub(crate) struct NodeEntry<S, C> {
    pub(crate) attributes: S,
    /// Collection currently holding this node, `None` while detached
    pub(crate) parent: Option<CollectionId>,
    pub(crate) children: C,
    pub(crate) listeners: Listeners,
    /// Bus of the `children` collection
    pub(crate) child_listeners: Listeners,
}

/// Live tree of observable nodes.
///
/// ## Example
///
/// ```rust
/// use serde_json::json;
/// use treemodel::domain::{Predicate, Tree};
///
/// let tree = Tree::from_value(json!({
///     "id": "root",
///     "children": [{"id": "a", "tagname": "div"}, {"id": "b", "tagname": "div"}]
/// }))
/// .unwrap();
///
/// let root = tree.root().unwrap();
/// let a = tree.find(root, "a").unwrap();
/// assert_eq!(tree.next(a), tree.find(root, "b"));
/// assert_eq!(tree.select(root, &Predicate::from([("tagname", "div")])).len(), 2);
/// ```
pub struct Tree<F: NodeFactory = DefaultFactory> {
    pub(crate) arena: Arena<NodeEntry<F::Store, F::Children>>,
    pub(crate) top_level: F::Children,
    pub(crate) top_level_listeners: Listeners,
    pub(crate) factory: F,
    pub(crate) config: TreeConfig,
    listener_seq: u64,
}

impl<F: NodeFactory> fmt::Debug for Tree<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.arena.len())
            .field("roots", &self.top_level.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree using [`DefaultFactory`].
    pub fn new() -> Self {
        Self::with_factory(DefaultFactory)
    }

    /// Build a tree from a nested record, or from an array of records (one
    /// root per element).
    pub fn from_value(value: Value) -> TreeResult<Self> {
        let mut tree = Self::new();
        tree.load(value)?;
        Ok(tree)
    }
}

impl<F: NodeFactory> Tree<F> {
    /// Create an empty tree whose nodes and collections are built by `factory`.
    pub fn with_factory(factory: F) -> Self {
        Self {
            arena: Arena::new(),
            top_level: factory.create_children(),
            top_level_listeners: Listeners::default(),
            factory,
            config: TreeConfig::default(),
            listener_seq: 0,
        }
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Append the roots described by `value` to the top-level collection.
    ///
    /// An object adds one root, an array adds one root per element.
    #[instrument(level = "debug", skip(self, value))]
    pub fn load(&mut self, value: Value) -> TreeResult<Vec<NodeId>> {
        let records = match value {
            Value::Array(records) => records,
            record => vec![record],
        };
        for record in &records {
            self.validate_record(record)?;
        }
        let mut roots = Vec::with_capacity(records.len());
        for record in records {
            let root = self.build_record(record)?;
            self.link(root, CollectionId::TopLevel, usize::MAX);
            self.dispatch(
                Some(root),
                Some(CollectionId::TopLevel),
                TreeEvent::new(EventKind::Add, Some(root)).in_collection(CollectionId::TopLevel),
            );
            roots.push(root);
        }
        debug!(count = roots.len(), "loaded roots");
        Ok(roots)
    }

    /// Add a single root built from `record` to the top-level collection.
    pub fn add_root(&mut self, record: Value) -> TreeResult<NodeId> {
        if !record.is_object() {
            return Err(TreeError::structure(format!(
                "expected a single object record, got {record}"
            )));
        }
        let mut roots = self.load(record)?;
        roots
            .pop()
            .ok_or_else(|| TreeError::structure("expected a single record"))
    }

    /// Build a detached subtree from `record`.
    ///
    /// The returned node is a root outside the top-level collection until it
    /// is added somewhere.
    pub fn create(&mut self, record: Value) -> TreeResult<NodeId> {
        self.validate_record(&record)?;
        self.build_record(record)
    }

    /// The first root of the top-level collection.
    pub fn root(&self) -> Option<NodeId> {
        self.top_level.at(0)
    }

    /// All roots held by the top-level collection.
    pub fn roots(&self) -> Vec<NodeId> {
        self.top_level.to_vec()
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// True while `node` refers to a live node.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.arena.contains(node.0)
    }

    // ------------------------------------------------------------
    // attributes
    // ------------------------------------------------------------

    pub fn get(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.entry(node)?.attributes.get(name)
    }

    /// The node's `id` attribute (per [`TreeConfig::id_key`]).
    pub fn id_of(&self, node: NodeId) -> Option<&Value> {
        self.get(node, &self.config.id_key)
    }

    pub fn attributes(&self, node: NodeId) -> Option<&Map<String, Value>> {
        Some(self.entry(node)?.attributes.attributes())
    }

    pub fn store(&self, node: NodeId) -> Option<&F::Store> {
        Some(&self.entry(node)?.attributes)
    }

    /// Set an attribute and fire `change:<name>` then `change`.
    ///
    /// Setting a value equal to the current one is silent. Returns the
    /// previous value.
    #[instrument(level = "trace", skip(self, value))]
    pub fn set(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> TreeResult<Option<Value>> {
        let value = value.into();
        if name == self.config.children_key {
            return Err(TreeError::ReservedAttribute(name.to_string()));
        }
        let entry = self.entry_mut(node).ok_or(TreeError::NodeNotFound(node))?;
        if entry.attributes.get(name) == Some(&value) {
            return Ok(Some(value));
        }
        let previous = entry.attributes.set(name, value.clone());
        let via = entry.parent;
        self.dispatch(
            Some(node),
            via,
            TreeEvent::change(node, name, value.clone(), previous.clone(), true),
        );
        self.dispatch(
            Some(node),
            via,
            TreeEvent::change(node, name, value, previous.clone(), false),
        );
        Ok(previous)
    }

    /// Remove an attribute, firing change events if it was present.
    pub fn unset(&mut self, node: NodeId, name: &str) -> TreeResult<Option<Value>> {
        let entry = self.entry_mut(node).ok_or(TreeError::NodeNotFound(node))?;
        let Some(previous) = entry.attributes.unset(name) else {
            return Ok(None);
        };
        let via = entry.parent;
        for scoped in [true, false] {
            self.dispatch(
                Some(node),
                via,
                TreeEvent::change(node, name, Value::Null, Some(previous.clone()), scoped),
            );
        }
        Ok(Some(previous))
    }

    // ------------------------------------------------------------
    // storage plumbing
    // ------------------------------------------------------------

    pub(crate) fn entry(&self, node: NodeId) -> Option<&NodeEntry<F::Store, F::Children>> {
        self.arena.get(node.0)
    }

    pub(crate) fn entry_mut(
        &mut self,
        node: NodeId,
    ) -> Option<&mut NodeEntry<F::Store, F::Children>> {
        self.arena.get_mut(node.0)
    }

    pub(crate) fn parent_collection(&self, node: NodeId) -> Option<CollectionId> {
        self.entry(node)?.parent
    }

    pub(crate) fn sequence(&self, collection: CollectionId) -> Option<&F::Children> {
        match collection {
            CollectionId::TopLevel => Some(&self.top_level),
            CollectionId::Children(owner) => Some(&self.entry(owner)?.children),
        }
    }

    pub(crate) fn sequence_mut(&mut self, collection: CollectionId) -> Option<&mut F::Children> {
        match collection {
            CollectionId::TopLevel => Some(&mut self.top_level),
            CollectionId::Children(owner) => Some(&mut self.entry_mut(owner)?.children),
        }
    }

    pub(crate) fn collection_listeners_mut(
        &mut self,
        collection: CollectionId,
    ) -> Option<&mut Listeners> {
        match collection {
            CollectionId::TopLevel => Some(&mut self.top_level_listeners),
            CollectionId::Children(owner) => Some(&mut self.entry_mut(owner)?.child_listeners),
        }
    }

    /// Children of `node` in sibling order; empty for a stale node.
    pub(crate) fn child_ids(&self, node: NodeId) -> Vec<NodeId> {
        self.entry(node)
            .map(|entry| entry.children.to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn next_listener_id(&mut self) -> ListenerId {
        self.listener_seq += 1;
        ListenerId(self.listener_seq)
    }

    /// Check the nested record shape before anything is allocated, so a
    /// malformed record leaves the tree untouched.
    pub(crate) fn validate_record(&self, record: &Value) -> TreeResult<()> {
        let mut pending = vec![record];
        while let Some(record) = pending.pop() {
            let Value::Object(map) = record else {
                return Err(TreeError::structure(format!(
                    "expected an object record, got {record}"
                )));
            };
            match map.get(&self.config.children_key) {
                None | Some(Value::Null) => {}
                Some(Value::Array(children)) => pending.extend(children.iter()),
                Some(other) => {
                    return Err(TreeError::structure(format!(
                        "`{}` must be an array, got {other}",
                        self.config.children_key
                    )))
                }
            }
        }
        Ok(())
    }

    /// Allocate the subtree described by a validated record. No events fire:
    /// nothing can be listening on nodes that do not exist yet.
    pub(crate) fn build_record(&mut self, record: Value) -> TreeResult<NodeId> {
        let mut top = None;
        // children are pushed last-first so siblings are appended in order
        let mut pending: Vec<(Value, Option<NodeId>)> = vec![(record, None)];
        while let Some((record, parent)) = pending.pop() {
            let Value::Object(mut map) = record else {
                return Err(TreeError::structure("expected an object record"));
            };
            let children = match map.remove(&self.config.children_key) {
                Some(Value::Array(children)) => children,
                _ => Vec::new(),
            };
            let entry = NodeEntry {
                attributes: self.factory.create_store(map),
                parent: None,
                children: self.factory.create_children(),
                listeners: Listeners::default(),
                child_listeners: Listeners::default(),
            };
            let node = NodeId(self.arena.insert(entry));
            trace!(%node, children = children.len(), "built node");
            match parent {
                Some(parent) => self.link(node, CollectionId::Children(parent), usize::MAX),
                None => top = Some(node),
            }
            pending.extend(children.into_iter().rev().map(|child| (child, Some(node))));
        }
        top.ok_or_else(|| TreeError::structure("expected an object record"))
    }

    /// Place a detached node into `collection` at `index` (clamped).
    pub(crate) fn link(&mut self, node: NodeId, collection: CollectionId, index: usize) {
        if let Some(sequence) = self.sequence_mut(collection) {
            sequence.insert(index, node);
        }
        if let Some(entry) = self.entry_mut(node) {
            entry.parent = Some(collection);
        }
    }

    /// Take `node` out of its collection without destroying it.
    ///
    /// Fires `remove` at the node's former place. Returns the former
    /// collection, `None` if the node was already detached.
    pub(crate) fn detach(&mut self, node: NodeId) -> Option<CollectionId> {
        let collection = self.entry_mut(node)?.parent.take()?;
        if let Some(sequence) = self.sequence_mut(collection) {
            sequence.remove_item(node);
        }
        self.dispatch(
            Some(node),
            Some(collection),
            TreeEvent::new(EventKind::Remove, Some(node)).in_collection(collection),
        );
        Some(collection)
    }

    /// Free `node` and everything below it. The node must be detached.
    pub(crate) fn destroy(&mut self, node: NodeId) -> usize {
        let mut freed = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.arena.remove(current.0) {
                stack.extend(entry.children.to_vec());
                freed += 1;
            }
        }
        trace!(%node, freed, "destroyed subtree");
        freed
    }
}
