//! Text rendering of a subtree with `termtree`

use std::collections::HashMap;

use serde_json::Value;
use termtree::Tree as TermTree;

use crate::domain::entities::NodeId;
use crate::domain::factory::NodeFactory;
use crate::domain::tree::Tree;

impl<F: NodeFactory> Tree<F> {
    /// One-line label of `node`: the values of the first present
    /// `label_keys`, joined by spaces. Strings are shown unquoted.
    pub fn label(&self, node: NodeId, label_keys: &[String]) -> String {
        let parts: Vec<String> = label_keys
            .iter()
            .filter_map(|key| self.get(node, key))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();
        if parts.is_empty() {
            format!("<{node}>")
        } else {
            parts.join(" ")
        }
    }

    /// Render `node` and its descendants as a `termtree` tree of labels.
    pub fn to_tree_string(&self, node: NodeId, label_keys: &[String]) -> TermTree<String> {
        let order: Vec<NodeId> = self.iter_from(node).collect();
        let mut built: HashMap<NodeId, TermTree<String>> = HashMap::with_capacity(order.len());
        // reversed pre-order reaches every child before its parent
        for &current in order.iter().rev() {
            let leaves: Vec<_> = self
                .child_ids(current)
                .into_iter()
                .filter_map(|child| built.remove(&child))
                .collect();
            let rendered = TermTree::new(self.label(current, label_keys)).with_leaves(leaves);
            built.insert(current, rendered);
        }
        built
            .remove(&node)
            .unwrap_or_else(|| TermTree::new(self.label(node, label_keys)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::tree::Tree;

    #[test]
    fn test_to_tree_string_renders_labels() {
        let tree = Tree::from_value(json!({
            "id": "root",
            "children": [{"id": "a", "tagname": "div"}, {"tagname": "p"}]
        }))
        .unwrap();
        let keys = vec!["id".to_string(), "tagname".to_string()];
        let rendered = tree.to_tree_string(tree.root().unwrap(), &keys).to_string();
        assert!(rendered.starts_with("root\n"));
        assert!(rendered.contains("a div"));
        assert!(rendered.contains("└── p"));
    }
}
