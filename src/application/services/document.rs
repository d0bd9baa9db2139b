//! Tree document service
//!
//! Loads JSON documents (a single nested record or an array of them) into a
//! [`Tree`], runs queries and edits against them, and writes them back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{Matched, NodeId, Predicate, Tree};
use crate::infrastructure::traits::FileSystem;

/// A tree loaded from a file.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub tree: Tree,
    /// The file held an array of records rather than a single record
    pub is_collection: bool,
}

impl Document {
    /// Current tree in the shape the file was read in.
    pub fn to_value(&self) -> Value {
        match (self.is_collection, self.tree.root()) {
            (false, Some(root)) if self.tree.roots().len() == 1 => {
                self.tree.to_json(root).unwrap_or(Value::Null)
            }
            _ => self.tree.to_value(),
        }
    }

    /// Find a node by id across all roots.
    ///
    /// `id` is matched as a string first, then as a JSON scalar, so `2`
    /// finds both `"id": "2"` and `"id": 2`.
    pub fn resolve(&self, id: &str) -> ApplicationResult<NodeId> {
        let top_level = self.tree.top_level();
        top_level
            .find_by_id(id)
            .or_else(|| {
                serde_json::from_str::<Value>(id)
                    .ok()
                    .filter(|value| !value.is_object() && !value.is_array())
                    .and_then(|value| top_level.find_by_id(value))
            })
            .ok_or_else(|| ApplicationError::UnknownNode {
                id: id.to_string(),
                path: self.path.clone(),
            })
    }
}

/// Where a moved node ends up relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the target's children
    Child,
    /// Left sibling of the target
    Before,
    /// Right sibling of the target
    After,
}

/// Service for loading, querying and editing tree documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl DocumentService {
    /// Create a new document service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read and parse a document.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Document> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| ApplicationError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let is_collection = value.is_array();
        let mut tree = Tree::new().with_config(self.settings.tree_config());
        let roots = tree.load(value)?;
        debug!(roots = roots.len(), nodes = tree.len(), "loaded document");
        Ok(Document {
            path: path.to_path_buf(),
            tree,
            is_collection,
        })
    }

    /// Write the document back to its path.
    #[instrument(level = "debug", skip(self, document), fields(path = %document.path.display()))]
    pub fn save(&self, document: &Document) -> ApplicationResult<()> {
        let mut content = self.format_json(&document.to_value())?;
        content.push('\n');
        self.fs
            .write(&document.path, &content)
            .with_path_context("write document", &document.path)
    }

    /// Serialize `value` honouring the `pretty` setting.
    pub fn format_json(&self, value: &Value) -> ApplicationResult<String> {
        let formatted = if self.settings.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        formatted.map_err(|e| ApplicationError::OperationFailed {
            context: "serialize JSON".into(),
            source: Box::new(e),
        })
    }

    /// Every root rendered as a text tree.
    pub fn render(&self, document: &Document) -> String {
        document
            .tree
            .roots()
            .into_iter()
            .map(|root| {
                document
                    .tree
                    .to_tree_string(root, &self.settings.label_keys)
                    .to_string()
            })
            .collect()
    }

    pub fn label(&self, document: &Document, node: NodeId) -> String {
        document.tree.label(node, &self.settings.label_keys)
    }

    /// Chained predicate query.
    ///
    /// The first predicate is matched against the subtree of `from`, or
    /// against the top-level records (their whole subtrees when `deep`).
    /// Every further predicate is matched below the previous result.
    pub fn select(
        &self,
        document: &Document,
        from: Option<&str>,
        chain: &[Predicate],
        deep: bool,
    ) -> ApplicationResult<Matched> {
        let tree = &document.tree;
        let Some((first, rest)) = chain.split_first() else {
            return Ok(match from {
                Some(id) => Matched::new([document.resolve(id)?]),
                None => Matched::new(tree.roots()),
            });
        };
        let mut matched = match from {
            Some(id) => tree.select(document.resolve(id)?, first),
            None => tree.top_level().select(first, deep),
        };
        for predicate in rest {
            matched = matched.select(tree, predicate);
        }
        debug!(count = matched.len(), stages = chain.len(), "select");
        Ok(matched)
    }

    /// Pre-order listing of every node below `from` (or every root).
    pub fn flatten(&self, document: &Document, from: Option<&str>) -> ApplicationResult<Matched> {
        match from {
            Some(id) => Ok(document.tree.flatten(document.resolve(id)?)),
            None => Ok(document.tree.top_level().flatten()),
        }
    }

    /// Move the node `id` next to or under `target`.
    ///
    /// Placing a node beside itself is an error; an empty result means
    /// `target` is a root and nothing moved.
    #[instrument(level = "debug", skip(self, document))]
    pub fn move_node(
        &self,
        document: &mut Document,
        id: &str,
        target: &str,
        placement: Placement,
    ) -> ApplicationResult<Vec<NodeId>> {
        let node = document.resolve(id)?;
        let target = document.resolve(target)?;
        if node == target && placement != Placement::Child {
            return Err(ApplicationError::SelfPlacement(id.to_string()));
        }
        let tree = &mut document.tree;
        let moved = match placement {
            Placement::Child => tree.add(target, node)?,
            Placement::Before => tree.insert_before(target, node)?,
            Placement::After => tree.insert_after(target, node)?,
        };
        Ok(moved)
    }

    /// Remove the node `id` with its subtree. `false` for a root.
    pub fn remove_node(&self, document: &mut Document, id: &str) -> ApplicationResult<bool> {
        let node = document.resolve(id)?;
        Ok(document.tree.remove(node))
    }

    /// Set attributes on the node `id`, optionally on its whole subtree.
    pub fn set_attributes(
        &self,
        document: &mut Document,
        id: &str,
        attributes: Map<String, Value>,
        descendants: bool,
    ) -> ApplicationResult<()> {
        let node = document.resolve(id)?;
        if descendants {
            document
                .tree
                .set_prop_descendants(node, Value::Object(attributes))?;
        } else {
            for (name, value) in attributes {
                document.tree.set(node, &name, value)?;
            }
        }
        Ok(())
    }
}

/// Parse `key=value` arguments. Values are read as JSON when they parse
/// (`300`, `true`, `"x"`), otherwise taken as plain strings.
pub fn parse_assignments(args: &[String]) -> ApplicationResult<Map<String, Value>> {
    args.iter()
        .map(|arg| {
            let (key, raw) = arg
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| ApplicationError::InvalidAssignment(arg.clone()))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}

/// Parse `key=value` arguments into a predicate.
pub fn parse_predicate(args: &[String]) -> ApplicationResult<Predicate> {
    parse_assignments(args).map(Predicate::from)
}
