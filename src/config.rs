//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treemodel/treemodel.toml`
//! 3. Local config: `<document_dir>/.treemodel.toml`
//! 4. Environment variables: `TREEMODEL_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::TreeConfig;

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub children_key: Option<String>,
    pub id_key: Option<String>,
    pub pretty: Option<bool>,
    pub label_keys: Option<Vec<String>>,
}

/// Unified configuration for treemodel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Key introducing nested child records (default: "children")
    pub children_key: String,
    /// Attribute used for id lookup (default: "id")
    pub id_key: String,
    /// Pretty-print JSON output and saved documents
    pub pretty: bool,
    /// Attributes shown as node labels, in order
    pub label_keys: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let tree = TreeConfig::default();
        Self {
            children_key: tree.children_key,
            id_key: tree.id_key,
            pretty: true,
            label_keys: vec!["id".into(), "tagname".into(), "title".into()],
        }
    }
}

/// Get the XDG config directory for treemodel.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treemodel").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treemodel.toml"))
}

/// Get the path to the local config file next to a document.
pub fn local_config_path(document_dir: &Path) -> PathBuf {
    document_dir.join(".treemodel.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Key names the tree engine needs.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            children_key: self.children_key.clone(),
            id_key: self.id_key.clone(),
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            children_key: overlay
                .children_key
                .clone()
                .unwrap_or_else(|| self.children_key.clone()),
            id_key: overlay.id_key.clone().unwrap_or_else(|| self.id_key.clone()),
            pretty: overlay.pretty.unwrap_or(self.pretty),
            label_keys: overlay
                .label_keys
                .clone()
                .unwrap_or_else(|| self.label_keys.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `document_dir` - Optional directory of the document for local config
    pub fn load(document_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|path| path.exists());
        let local = document_dir
            .map(local_config_path)
            .filter(|path| path.exists());
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Load settings from explicit config files (either may be absent).
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply TREEMODEL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("TREEMODEL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("label_keys")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("children_key") {
            settings.children_key = val;
        }
        if let Ok(val) = config.get_string("id_key") {
            settings.id_key = val;
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("label_keys") {
            settings.label_keys = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.children_key.is_empty() || self.id_key.is_empty() {
            return Err(ApplicationError::Config {
                message: "children_key and id_key must not be empty".into(),
            });
        }
        if self.children_key == self.id_key {
            return Err(ApplicationError::Config {
                message: format!(
                    "children_key and id_key must differ (both are `{}`)",
                    self.id_key
                ),
            });
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
