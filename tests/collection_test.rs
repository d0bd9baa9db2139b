//! Tests for collection views, the top-level collection and chained queries

mod common;

use rstest::rstest;
use serde_json::json;

use common::{id_str, node, page};
use treemodel::domain::{CollectionId, Matched, Predicate, Tree};

// ============================================================
// select on collections and results
// ============================================================

#[rstest]
fn given_child_collections_when_selecting_deep_then_searches_member_subtrees(page: Tree) {
    let root = page.root().unwrap();
    let p = Predicate::from([("tagname", "p")]);

    let from_root = page.nodes(root).unwrap().select(&p, true);
    let from_sidebar = page.nodes(node(&page, "sidebar")).unwrap().select(&p, true);

    assert_eq!(from_root.len(), 2);
    assert_eq!(from_sidebar.len(), 1);
}

#[rstest]
fn given_child_collection_when_selecting_shallow_then_only_members_are_tested(page: Tree) {
    let wrapper = node(&page, "wrapper");
    let divs = Predicate::from([("tagname", "div")]);

    let members = page.nodes(wrapper).unwrap().select(&divs, false);
    let root_children = page.nodes(page.root().unwrap()).unwrap();
    let nothing = root_children.select(&Predicate::from([("tagname", "p")]), false);

    assert_eq!(members.as_slice(), &[node(&page, "sidebar"), node(&page, "content")]);
    assert!(nothing.is_empty());
}

#[rstest]
#[case("div", "span", 2)]
#[case("anchor", "span", 1)]
#[case("ul", "li", 3)]
#[case("h2", "span", 0)]
fn given_first_result_when_chaining_select_then_searches_below_each_match(
    page: Tree,
    #[case] outer: &str,
    #[case] inner: &str,
    #[case] expected: usize,
) {
    let root = page.root().unwrap();

    let matched = page
        .select(root, &Predicate::from([("tagname", outer)]))
        .select(&page, &Predicate::from([("tagname", inner)]));

    assert_eq!(matched.len(), expected);
}

#[rstest]
fn given_overlapping_subtrees_when_chaining_then_results_are_deduplicated(page: Tree) {
    let root = page.root().unwrap();
    let divs = page.select(root, &Predicate::from([("tagname", "div")]));

    let everything = divs.select(&page, &Predicate::new());

    // wrapper's subtree already holds every other div's subtree
    assert_eq!(everything.len(), 13);
    assert_eq!(everything.first(), Some(node(&page, "wrapper")));
}

#[rstest]
fn given_result_when_finding_by_id_then_searches_each_subtree(page: Tree) {
    let root = page.root().unwrap();
    let divs = page.select(root, &Predicate::from([("tagname", "div")]));

    let found = divs.find_by_id(&page, "title");

    // wrapper and content both reach title; it is listed once
    assert_eq!(found.as_slice(), &[node(&page, "title")]);
}

#[test]
fn given_duplicate_handles_when_collecting_matched_then_first_occurrence_wins() {
    let tree = Tree::from_value(json!([{"id": "a"}, {"id": "b"}])).unwrap();
    let roots = tree.roots();

    let matched: Matched = [roots[1], roots[0], roots[1]].into_iter().collect();

    assert_eq!(matched.into_vec(), vec![roots[1], roots[0]]);
}

// ============================================================
// collection access
// ============================================================

#[rstest]
fn given_child_collection_when_reading_then_positions_are_consistent(page: Tree) {
    let sidebar = node(&page, "sidebar");
    let children = page.nodes(sidebar).unwrap();

    assert_eq!(children.owner(), Some(sidebar));
    assert_eq!(children.id(), CollectionId::Children(sidebar));
    for (index, child) in children.iter().enumerate() {
        assert_eq!(children.at(index), Some(child));
        assert_eq!(children.index_of(child), Some(index));
        assert_eq!(page.index(child), Some(index));
    }
    assert_eq!(children.at(3), None);
}

#[rstest]
fn given_collection_when_walking_then_stops_across_members(page: Tree) {
    let wrapper = node(&page, "wrapper");
    let mut visited = Vec::new();

    let stopped = page.nodes(wrapper).unwrap().walk(|current| {
        visited.push(current);
        id_str(&page, current).as_deref() != Some("title")
    });

    assert_eq!(stopped, Some(node(&page, "title")));
    // sidebar subtree (7) + content + title
    assert_eq!(visited.len(), 9);
}

#[rstest]
fn given_collection_when_flattening_then_concatenates_member_subtrees(page: Tree) {
    let wrapper = node(&page, "wrapper");

    let flat = page.nodes(wrapper).unwrap().flatten();

    assert_eq!(flat.len(), 12);
    assert_eq!(page.nodes(wrapper).unwrap().find_by_id("title"), Some(node(&page, "title")));
}

#[rstest]
fn given_collection_when_inserting_at_index_then_lands_there(mut page: Tree) {
    let sidebar = node(&page, "sidebar");

    let inserted = page
        .insert_into(
            CollectionId::Children(sidebar),
            json!([{"id": "x"}, {"id": "y"}]),
            Some(1),
        )
        .unwrap();

    let children = page.nodes(sidebar).unwrap();
    assert_eq!(children.len(), 5);
    assert_eq!(children.at(1), inserted.first().copied());
    assert_eq!(children.at(2), inserted.get(1).copied());
}

#[rstest]
fn given_member_when_removing_from_collection_then_only_members_qualify(mut page: Tree) {
    let sidebar = node(&page, "sidebar");
    let content = node(&page, "content");
    let title = node(&page, "title");

    assert!(!page.remove_from(CollectionId::Children(sidebar), title));
    assert!(page.remove_from(CollectionId::Children(content), title));
    assert!(page.find(content, "title").is_none());
}

#[rstest]
fn given_collection_when_resetting_then_members_are_destroyed(mut page: Tree) {
    let sidebar = node(&page, "sidebar");

    let freed = page.reset(CollectionId::Children(sidebar)).unwrap();

    assert_eq!(freed, 6);
    assert!(page.nodes(sidebar).is_none());
    assert_eq!(page.len(), 8);
}

// ============================================================
// top-level collection
// ============================================================

#[test]
fn given_top_level_collection_when_removing_nested_node_then_json_drops_it() {
    // Arrange
    let mut tree = Tree::from_value(json!([
        {"id": 1, "title": "Australia", "children": [{"id": 2, "title": "Sydney"}]}
    ]))
    .unwrap();
    assert_eq!(
        tree.to_value(),
        json!([{"id": 1, "title": "Australia", "children": [{"id": 2, "title": "Sydney"}]}])
    );
    let australia = tree.top_level().at(0).unwrap();
    let sydney = tree.nodes(australia).and_then(|c| c.at(0)).unwrap();

    // Act
    let removed = tree.remove_from(CollectionId::Children(australia), sydney);

    // Assert
    assert!(removed);
    assert_eq!(tree.to_value(), json!([{"id": 1, "title": "Australia"}]));
}

#[test]
fn given_several_roots_when_querying_top_level_then_each_root_is_independent() {
    let mut tree = Tree::from_value(json!([
        {"id": "a", "tagname": "div", "children": [{"id": "a1", "tagname": "p"}]},
        {"id": "b", "tagname": "div", "children": [{"id": "b1", "tagname": "p"}]}
    ]))
    .unwrap();
    let top = tree.top_level();
    let (a, b) = (top.at(0).unwrap(), top.at(1).unwrap());

    assert!(tree.is_root(a) && tree.is_root(b));
    assert_eq!(tree.next(a), None);
    assert_eq!(top.select(&Predicate::from([("tagname", "p")]), true).len(), 2);
    assert_eq!(top.select(&Predicate::from([("tagname", "div")]), false).len(), 2);
    assert_eq!(top.find_by_id("b1"), tree.find(b, "b1"));
    assert!(!tree.contains(a, tree.find(b, "b1").unwrap()));

    assert!(!tree.remove(b));
    assert!(tree.remove_from(CollectionId::TopLevel, b));
    assert_eq!(tree.roots(), vec![a]);
}
