//! Integration tests for Settings config loading with layered precedence.
//!
//! Precedence: defaults < global file < local file < TREEMODEL_* env vars.
//! These tests pass explicit file paths, so a real global config on the
//! machine never leaks in. Env var overrides live in `config_env_test.rs`.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use treemodel::application::ApplicationError;
use treemodel::config::{local_config_path, Settings};

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_no_config_files_when_load_then_returns_defaults() {
    let settings = Settings::load_from(None, None).expect("load settings");

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.children_key, "children");
    assert_eq!(settings.id_key, "id");
    assert!(settings.pretty);
    assert_eq!(settings.label_keys, vec!["id", "tagname", "title"]);
}

#[test]
fn given_local_config_when_load_then_overrides_only_specified_fields() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, ".treemodel.toml", "children_key = \"nodes\"\n");

    // Act
    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    // Assert
    assert_eq!(settings.children_key, "nodes");
    assert_eq!(settings.id_key, "id");
    assert!(settings.pretty);
}

#[test]
fn given_global_and_local_config_when_load_then_local_wins() {
    let dir = TempDir::new().unwrap();
    let global = write_config(
        &dir,
        "treemodel.toml",
        "id_key = \"key\"\npretty = false\nlabel_keys = [\"key\"]\n",
    );
    let local = write_config(&dir, ".treemodel.toml", "pretty = true\n");

    let settings = Settings::load_from(Some(&global), Some(&local)).expect("load settings");

    assert_eq!(settings.id_key, "key");
    assert!(settings.pretty);
    assert_eq!(settings.label_keys, vec!["key"]);
}

#[test]
fn given_identical_keys_when_load_then_rejected_as_config_error() {
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, ".treemodel.toml", "children_key = \"id\"\n");

    let result = Settings::load_from(None, Some(&local));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_toml_when_load_then_reports_path() {
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, ".treemodel.toml", "pretty = [unclosed\n");

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(err.to_string().contains(".treemodel.toml"));
}

#[test]
fn given_document_dir_when_resolving_local_path_then_uses_dotfile() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        local_config_path(dir.path()),
        dir.path().join(".treemodel.toml")
    );
}

#[test]
fn given_settings_when_rendering_toml_then_it_parses_back() {
    let settings = Settings {
        children_key: "nodes".into(),
        ..Settings::default()
    };

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
}

#[test]
fn given_tree_config_when_derived_then_carries_keys() {
    let settings = Settings {
        children_key: "nodes".into(),
        id_key: "key".into(),
        ..Settings::default()
    };

    let tree_config = settings.tree_config();

    assert_eq!(tree_config.children_key, "nodes");
    assert_eq!(tree_config.id_key, "key");
}
