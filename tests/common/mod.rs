//! Shared fixtures: the page layout tree used across integration tests
#![allow(dead_code)]

use rstest::fixture;
use serde_json::{json, Value};

use treemodel::domain::{NodeId, Tree};

/// body > wrapper > {sidebar > [p, ul > li*3, span], content > [title, p > anchor > span]}
///
/// 14 nodes, three of them divs.
pub fn page_record() -> Value {
    json!({
        "id": "root",
        "tagname": "body",
        "children": [{
            "id": "wrapper",
            "tagname": "div",
            "children": [
                {
                    "id": "sidebar",
                    "tagname": "div",
                    "width": 300,
                    "children": [
                        {"tagname": "p"},
                        {"tagname": "ul", "children": [
                            {"tagname": "li"},
                            {"tagname": "li"},
                            {"tagname": "li"}
                        ]},
                        {"tagname": "span"}
                    ]
                },
                {
                    "id": "content",
                    "tagname": "div",
                    "width": 600,
                    "children": [
                        {"id": "title", "tagname": "h2"},
                        {"tagname": "p", "children": [
                            {"tagname": "anchor", "children": [{"tagname": "span"}]}
                        ]}
                    ]
                }
            ]
        }]
    })
}

#[fixture]
pub fn page() -> Tree {
    treemodel::util::testing::init_test_setup();
    Tree::from_value(page_record()).expect("fixture builds")
}

/// Look a node up by id from the first root, panicking when absent.
pub fn node(tree: &Tree, id: &str) -> NodeId {
    let root = tree.root().expect("tree has a root");
    tree.find(root, id)
        .unwrap_or_else(|| panic!("no node with id {id}"))
}

pub fn id_str(tree: &Tree, node: NodeId) -> Option<String> {
    tree.id_of(node).and_then(Value::as_str).map(String::from)
}
