//! Tests for DocumentService

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use common::page_record;
use treemodel::application::services::{parse_predicate, DocumentService, Placement};
use treemodel::application::ApplicationError;
use treemodel::config::Settings;
use treemodel::domain::Predicate;
use treemodel::infrastructure::di::ServiceContainer;
use treemodel::infrastructure::traits::RealFileSystem;

/// Helper to write a JSON document for testing
fn create_document(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).expect("write document");
    path
}

fn service() -> DocumentService {
    treemodel::util::testing::init_test_setup();
    DocumentService::new(Arc::new(RealFileSystem), Arc::new(Settings::default()))
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn given_single_record_when_loading_then_builds_one_root() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());

    // Act
    let document = service().load(&path).unwrap();

    // Assert
    assert!(!document.is_collection);
    assert_eq!(document.tree.roots().len(), 1);
    assert_eq!(document.tree.len(), 14);
    assert_eq!(document.to_value(), page_record());
}

#[test]
fn given_array_document_when_loading_then_keeps_array_shape() {
    let temp = TempDir::new().unwrap();
    let records = json!([{"id": 1, "title": "Australia"}, {"id": 2, "title": "Canada"}]);
    let path = create_document(&temp, "countries.json", &records);

    let document = service().load(&path).unwrap();

    assert!(document.is_collection);
    assert_eq!(document.to_value(), records);
}

#[test]
fn given_numeric_id_argument_when_resolving_then_matches_number_ids() {
    let temp = TempDir::new().unwrap();
    let records = json!([{"id": 1, "children": [{"id": 2, "title": "Sydney"}]}]);
    let path = create_document(&temp, "countries.json", &records);
    let document = service().load(&path).unwrap();

    let sydney = document.resolve("2").unwrap();

    assert_eq!(document.tree.get(sydney, "title"), Some(&json!("Sydney")));
}

#[test]
fn given_unknown_id_when_resolving_then_reports_unknown_node() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let document = service().load(&path).unwrap();

    let result = document.resolve("nowhere");

    assert!(matches!(result, Err(ApplicationError::UnknownNode { .. })));
}

#[test]
fn given_invalid_json_when_loading_then_reports_json_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = service().load(&path);

    assert!(matches!(result, Err(ApplicationError::Json { .. })));
}

#[test]
fn given_missing_file_when_loading_then_reports_operation_failed() {
    let temp = TempDir::new().unwrap();

    let result = service().load(&temp.path().join("absent.json"));

    assert!(matches!(result, Err(ApplicationError::OperationFailed { .. })));
}

#[test]
fn given_children_not_array_when_loading_then_reports_domain_error() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "bad.json", &json!({"id": "root", "children": 3}));

    let result = service().load(&path);

    assert!(matches!(result, Err(ApplicationError::Domain(_))));
}

#[test]
fn given_move_when_saving_then_file_reflects_new_structure() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let mut document = service.load(&path).unwrap();

    // Act
    service
        .move_node(&mut document, "sidebar", "title", Placement::After)
        .unwrap();
    service.save(&document).unwrap();

    // Assert
    let saved = read_json(&path);
    let wrapper = &saved["children"][0];
    assert_eq!(wrapper["children"].as_array().map(Vec::len), Some(1));
    assert_eq!(wrapper["children"][0]["children"][1]["id"], json!("sidebar"));
}

#[rstest]
#[case::before(Placement::Before)]
#[case::after(Placement::After)]
fn given_same_node_and_target_when_moving_beside_then_reports_self_placement(
    #[case] placement: Placement,
) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let mut document = service.load(&path).unwrap();

    // Act
    let result = service.move_node(&mut document, "sidebar", "sidebar", placement);

    // Assert
    assert!(matches!(result, Err(ApplicationError::SelfPlacement(id)) if id == "sidebar"));
    assert_eq!(document.to_value(), page_record());
}

#[test]
fn given_root_target_when_moving_beside_then_nothing_moves() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let mut document = service.load(&path).unwrap();

    let moved = service
        .move_node(&mut document, "sidebar", "root", Placement::Before)
        .unwrap();

    assert!(moved.is_empty());
    assert_eq!(document.tree.roots().len(), 1);
}

#[test]
fn given_root_when_removing_then_refused() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let mut document = service.load(&path).unwrap();

    assert!(!service.remove_node(&mut document, "root").unwrap());
    assert!(service.remove_node(&mut document, "sidebar").unwrap());
    assert_eq!(document.tree.len(), 7);
}

#[test]
fn given_descendants_flag_when_setting_then_whole_subtree_changes() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let mut document = service.load(&path).unwrap();
    let mut attributes = Map::new();
    attributes.insert("hidden".into(), json!(true));

    service
        .set_attributes(&mut document, "sidebar", attributes, true)
        .unwrap();

    let hidden = service
        .select(&document, None, &[Predicate::from([("hidden", true)])], true)
        .unwrap();
    assert_eq!(hidden.len(), 7);
}

#[test]
fn given_chain_when_selecting_then_each_stage_narrows_below_previous() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let document = service.load(&path).unwrap();
    let chain = [
        parse_predicate(&["tagname=div".to_string()]).unwrap(),
        parse_predicate(&["tagname=span".to_string()]).unwrap(),
    ];

    let deep = service.select(&document, None, &chain, true).unwrap();
    let shallow = service.select(&document, None, &chain, false).unwrap();
    let from_content = service.select(&document, Some("content"), &chain, false).unwrap();

    assert_eq!(deep.len(), 2);
    // the root is a body, so a top-level-only first stage finds no div
    assert!(shallow.is_empty());
    assert_eq!(from_content.len(), 1);
}

#[test]
fn given_document_when_rendering_then_labels_follow_settings() {
    let temp = TempDir::new().unwrap();
    let path = create_document(&temp, "page.json", &page_record());
    let service = service();
    let document = service.load(&path).unwrap();

    let rendered = service.render(&document);

    assert!(rendered.starts_with("root body\n"));
    assert!(rendered.contains("sidebar div"));
    assert!(rendered.contains("title h2"));
    assert_eq!(rendered.lines().count(), 14);
}

#[test]
fn given_container_when_built_then_documents_share_its_settings() {
    let settings = Settings {
        pretty: false,
        ..Settings::default()
    };

    let container = ServiceContainer::new(settings);

    assert!(!container.documents.settings().pretty);
    assert_eq!(
        container.documents.format_json(&json!({"a": [1, 2]})).unwrap(),
        r#"{"a":[1,2]}"#
    );
}
