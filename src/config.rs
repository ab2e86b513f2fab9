//! Configuration management for the schema monitor
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-monitor.toml)
//! - Environment variables (SCHEMA_MONITOR__*)
//!
//! ## Example config file (schema-monitor.toml):
//! ```toml
//! [store]
//! backend = "file"
//! path = "./data"
//!
//! [comparison]
//! required_path = "bare"
//!
//! [validation]
//! fail_on_breaking = true
//! honor_required_list = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compatibility::{ComparatorOptions, RequiredPathStyle};
use crate::store::{FileStore, InMemoryStore, SchemaStore};
use crate::validation::Validator;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub comparison: ComparisonConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Which store backs the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory of the file store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Path style of REQUIRED_ADDED records
    #[serde(default)]
    pub required_path: RequiredPathStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Exit non-zero from the CLIs when a comparison finds breaking changes
    #[serde(default)]
    pub fail_on_breaking: bool,

    /// Treat names in an object's `required` list as required fields
    #[serde(default = "default_true")]
    pub honor_required_list: bool,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: default_store_path(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fail_on_breaking: false,
            honor_required_list: true,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in [
            "schema-monitor.toml",
            ".schema-monitor.toml",
            "config/schema-monitor.toml",
        ] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "familiar", "schema-monitor") {
            let xdg_config = dirs.config_dir().join("schema-monitor.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_MONITOR")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Store path, resolved against the working directory
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.store.path)
        }
    }

    /// Open the configured backend at the configured path
    pub fn open_store(&self) -> crate::error::Result<Box<dyn SchemaStore>> {
        self.open_store_at(&self.store_path())
    }

    /// Open the configured backend; `path` is ignored by the memory backend
    pub fn open_store_at(&self, path: &Path) -> crate::error::Result<Box<dyn SchemaStore>> {
        Ok(match self.store.backend {
            StoreBackend::File => Box::new(FileStore::open(path)?),
            StoreBackend::Memory => Box::new(InMemoryStore::new()),
        })
    }

    pub fn comparator_options(&self) -> ComparatorOptions {
        ComparatorOptions {
            required_path: self.comparison.required_path,
        }
    }

    pub fn validator(&self) -> Validator {
        if self.validation.honor_required_list {
            Validator::new()
        } else {
            Validator::new().markers_only()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.comparison.required_path, RequiredPathStyle::Bare);
        assert!(config.validation.honor_required_list);
    }

    #[test]
    fn test_serialize_config() {
        let toml_str = toml::to_string_pretty(&MonitorConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[comparison]"));
        assert!(toml_str.contains("required_path = \"bare\""));
        assert!(!toml_str.contains("[intervals]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(
            &path,
            "[comparison]\nrequired_path = \"qualified\"\n\n[store]\nbackend = \"memory\"\n",
        )
        .unwrap();

        let config = MonitorConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.comparison.required_path, RequiredPathStyle::Qualified);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(
            config.comparator_options().required_path,
            RequiredPathStyle::Qualified
        );
    }

    #[test]
    fn test_open_store_follows_backend() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");

        let mut config = MonitorConfig::default();
        config.store.backend = StoreBackend::Memory;
        let store = config.open_store_at(&root).unwrap();
        assert!(store.find_all().unwrap().is_empty());
        assert!(!root.exists());

        config.store.backend = StoreBackend::File;
        config.store.path = root.clone();
        config.open_store().unwrap();
        assert!(root.join("records").is_dir());
    }
}
