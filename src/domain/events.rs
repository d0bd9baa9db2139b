//! Event bus and bubbling
//!
//! Every node carries two buses: its own, and the bus of the child collection
//! it owns. The top-level collection has a bus of its own as well.
//!
//! A local event `E` happening at node `X` is delivered, synchronously and in
//! this order, to:
//! 1. listeners on `X` under `E`,
//! 2. listeners on the collection holding `X` (for `remove`: the collection
//!    that held it) under `E`,
//! 3. listeners on every strict ancestor of `X`, nearest first, under
//!    `descendant:E`.
//!
//! A collection-level `reset` is delivered to the collection bus under
//! `reset` and to the owner and its ancestors under `descendant:reset`.
//!
//! Forwarding follows parent links at dispatch time, so no listener ever
//! holds a reference to an ancestor, and a detached node stops bubbling to
//! its former ancestors without any unsubscription step.

use serde_json::Value;
use tracing::trace;

use crate::domain::entities::{CollectionId, NodeId};
use crate::domain::factory::NodeFactory;
use crate::domain::tree::Tree;

/// Listener name receiving every event on a bus.
pub const ALL: &str = "all";

/// Prefix of events mirrored onto ancestors.
pub const DESCENDANT_PREFIX: &str = "descendant:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Change,
    Add,
    Remove,
    Reset,
    Custom(String),
}

/// Payload handed to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEvent {
    pub kind: EventKind,
    /// Local name, e.g. `change:width` or `add`
    pub name: String,
    /// Node the event happened to; the owner for a collection reset
    pub target: Option<NodeId>,
    /// Collection involved in structural events
    pub collection: Option<CollectionId>,
    pub attribute: Option<String>,
    pub value: Option<Value>,
    pub previous: Option<Value>,
    /// True when delivered to an ancestor of the target
    pub descendant: bool,
}

impl TreeEvent {
    pub(crate) fn new(kind: EventKind, target: Option<NodeId>) -> Self {
        let name = match &kind {
            EventKind::Change => "change".to_string(),
            EventKind::Add => "add".to_string(),
            EventKind::Remove => "remove".to_string(),
            EventKind::Reset => "reset".to_string(),
            EventKind::Custom(name) => name.clone(),
        };
        Self {
            kind,
            name,
            target,
            collection: None,
            attribute: None,
            value: None,
            previous: None,
            descendant: false,
        }
    }

    pub(crate) fn in_collection(mut self, collection: CollectionId) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Attribute change; `scoped` selects the `change:<attr>` form.
    pub(crate) fn change(
        target: NodeId,
        attribute: &str,
        value: Value,
        previous: Option<Value>,
        scoped: bool,
    ) -> Self {
        let mut event = Self::new(EventKind::Change, Some(target));
        if scoped {
            event.name = format!("change:{attribute}");
        }
        event.attribute = Some(attribute.to_string());
        event.value = Some(value);
        event.previous = previous;
        event
    }

    /// Name the event is delivered under.
    pub fn full_name(&self) -> String {
        if self.descendant {
            format!("{DESCENDANT_PREFIX}{}", self.name)
        } else {
            self.name.clone()
        }
    }

    fn as_descendant(&self) -> Self {
        let mut event = self.clone();
        event.descendant = true;
        event
    }
}

/// Revocable registration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub type Handler = Box<dyn FnMut(&TreeEvent)>;

/// Listeners of a single bus, notified in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, String, Handler)>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Listeners {
    pub(crate) fn push(&mut self, id: ListenerId, name: String, handler: Handler) {
        self.entries.push((id, name, handler));
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn notify(&mut self, event: &TreeEvent) {
        if self.entries.is_empty() {
            return;
        }
        let name = event.full_name();
        for (_, wanted, handler) in self.entries.iter_mut() {
            if *wanted == name || *wanted == ALL {
                handler(event);
            }
        }
    }
}

impl<F: NodeFactory> Tree<F> {
    /// Subscribe to events delivered on `node`'s bus.
    ///
    /// Returns `None` for a stale node.
    pub fn on(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        handler: impl FnMut(&TreeEvent) + 'static,
    ) -> Option<ListenerId> {
        let id = self.next_listener_id();
        let entry = self.entry_mut(node)?;
        entry.listeners.push(id, name.into(), Box::new(handler));
        Some(id)
    }

    /// Revoke a subscription made with [`Tree::on`].
    pub fn off(&mut self, node: NodeId, listener: ListenerId) -> bool {
        self.entry_mut(node)
            .is_some_and(|entry| entry.listeners.remove(listener))
    }

    /// Subscribe to events delivered on a collection's bus.
    pub fn on_collection(
        &mut self,
        collection: CollectionId,
        name: impl Into<String>,
        handler: impl FnMut(&TreeEvent) + 'static,
    ) -> Option<ListenerId> {
        let id = self.next_listener_id();
        let listeners = self.collection_listeners_mut(collection)?;
        listeners.push(id, name.into(), Box::new(handler));
        Some(id)
    }

    pub fn off_collection(&mut self, collection: CollectionId, listener: ListenerId) -> bool {
        self.collection_listeners_mut(collection)
            .is_some_and(|listeners| listeners.remove(listener))
    }

    /// Number of listeners registered on `node`'s own bus.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.entry(node).map_or(0, |entry| entry.listeners.len())
    }

    /// Fire a custom event at `node`; it bubbles like any local event.
    pub fn trigger(&mut self, node: NodeId, name: impl Into<String>) -> bool {
        if !self.contains_node(node) {
            return false;
        }
        let via = self.parent_collection(node);
        let mut event = TreeEvent::new(EventKind::Custom(name.into()), Some(node));
        event.collection = via;
        self.dispatch(Some(node), via, event);
        true
    }

    /// Deliver `event` to `origin`, to the collection `via`, then as a
    /// descendant event to the owner of `via` and each of its ancestors.
    pub(crate) fn dispatch(
        &mut self,
        origin: Option<NodeId>,
        via: Option<CollectionId>,
        event: TreeEvent,
    ) {
        trace!(event = %event.name, ?origin, ?via, "dispatch");
        if let Some(node) = origin {
            if let Some(entry) = self.entry_mut(node) {
                entry.listeners.notify(&event);
            }
        }
        let Some(collection) = via else {
            return;
        };
        if let Some(listeners) = self.collection_listeners_mut(collection) {
            listeners.notify(&event);
        }
        let mirrored = event.as_descendant();
        let mut current = collection.owner();
        while let Some(ancestor) = current {
            let Some(entry) = self.entry_mut(ancestor) else {
                break;
            };
            entry.listeners.notify(&mirrored);
            current = self.parent(ancestor);
        }
    }
}
