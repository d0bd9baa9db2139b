//! Partial-attribute predicates

use serde_json::{Map, Value};

use crate::domain::error::TreeError;
use crate::domain::factory::AttributeStore;

/// Key/value mapping matched against a node's own attributes.
///
/// A node matches iff every key of the predicate is present on the node with
/// an equal value. Equality is `serde_json::Value` equality, so structured
/// values compare deeply and `300` differs from `300.0`. The empty predicate
/// matches every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate(Map<String, Value>);

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required `key == value` pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn matches<S: AttributeStore + ?Sized>(&self, store: &S) -> bool {
        self.0
            .iter()
            .all(|(key, expected)| store.get(key) == Some(expected))
    }
}

impl From<Map<String, Value>> for Predicate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Predicate {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(Predicate::new(), |p, (k, v)| p.with(k, v))
    }
}

impl TryFrom<Value> for Predicate {
    type Error = TreeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TreeError::InvalidPredicate(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

impl From<Predicate> for Map<String, Value> {
    fn from(predicate: Predicate) -> Self {
        predicate.0
    }
}
