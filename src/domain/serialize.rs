//! Serialization back to the nested record format
//!
//! Output is always built from the live tree, so any mutation is visible in
//! the next serialization.

use serde_json::{Map, Value};

use crate::domain::entities::{JsonOptions, NodeId};
use crate::domain::factory::{AttributeStore, NodeFactory, Sequence};
use crate::domain::tree::Tree;

impl<F: NodeFactory> Tree<F> {
    /// Serialize `node` and its subtree.
    pub fn to_json(&self, node: NodeId) -> Option<Value> {
        self.to_json_with(node, JsonOptions::default())
    }

    /// Serialize `node`: its own attributes, plus a children array unless
    /// `options.shallow`. The children key is omitted for a leaf.
    pub fn to_json_with(&self, node: NodeId, options: JsonOptions) -> Option<Value> {
        let mut stack = vec![self.json_frame(node, options)?];
        // post-order: a frame is closed once all its children are built
        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.pending.pop() {
                if let Some(child_frame) = self.json_frame(child, options) {
                    stack.push(child_frame);
                }
                continue;
            }
            let JsonFrame {
                mut map,
                built,
                has_children,
                ..
            } = stack.pop()?;
            if has_children {
                map.insert(self.config.children_key.clone(), Value::Array(built));
            }
            let value = Value::Object(map);
            match stack.last_mut() {
                Some(parent) => parent.built.push(value),
                None => return Some(value),
            }
        }
        None
    }

    fn json_frame(&self, node: NodeId, options: JsonOptions) -> Option<JsonFrame> {
        let entry = self.entry(node)?;
        let map = entry
            .attributes
            .attributes()
            .iter()
            .filter(|(key, _)| **key != self.config.children_key)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let has_children = !options.shallow && !entry.children.is_empty();
        let mut pending = if has_children {
            entry.children.to_vec()
        } else {
            Vec::new()
        };
        pending.reverse();
        Some(JsonFrame {
            map,
            pending,
            built: Vec::new(),
            has_children,
        })
    }

    /// Serialize the whole top-level collection as an array of records.
    pub fn to_value(&self) -> Value {
        self.top_level().to_json()
    }
}

/// A node whose children are still being serialized.
struct JsonFrame {
    map: Map<String, Value>,
    /// Children left to visit, last child first.
    pending: Vec<NodeId>,
    built: Vec<Value>,
    has_children: bool,
}
