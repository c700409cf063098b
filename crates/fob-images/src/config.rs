//! File-based options discovery
//!
//! Looks for plugin options next to a project, in the `[images]` table of
//! `fob.toml` or the `fob.images` field of `package.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;
use crate::options::PluginOptions;

/// Key holding the plugin options in either file
const SECTION: &str = "images";

/// File-based options discovery
///
/// # Example
///
/// ```no_run
/// use fob_images::config::OptionsDiscovery;
///
/// let discovery = OptionsDiscovery::new(".");
/// let options = discovery.load().unwrap();
/// ```
pub struct OptionsDiscovery {
    root: PathBuf,
}

impl OptionsDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a file carrying image options in the root directory
    ///
    /// Searches in this order:
    /// 1. fob.toml (`[images]` table)
    /// 2. package.json (`fob.images` field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join("fob.toml");
        if let Ok(content) = fs::read_to_string(&toml_path) {
            if let Ok(parsed) = toml::from_str::<toml::Table>(&content) {
                if parsed.contains_key(SECTION) {
                    return Some(toml_path);
                }
            }
        }

        let pkg_path = self.root.join("package.json");
        if let Ok(content) = fs::read_to_string(&pkg_path) {
            if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                if parsed
                    .get("fob")
                    .and_then(|fob| fob.get(SECTION))
                    .is_some_and(|images| !images.is_null())
                {
                    return Some(pkg_path);
                }
            }
        }

        None
    }

    /// Load options from the discovered file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no file carries image options.
    pub fn load(&self) -> Result<PluginOptions, ConfigError> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        tracing::debug!(path = %path.display(), "Loading image options");

        let content = fs::read_to_string(&path)?;
        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse options from the `[images]` table of a TOML document
    pub fn from_toml_str(content: &str) -> Result<PluginOptions, ConfigError> {
        let mut parsed: toml::Table = toml::from_str(content).map_err(|e| {
            ConfigError::invalid_value("toml", format!("Invalid TOML syntax: {e}"))
        })?;

        let images = parsed.remove(SECTION).ok_or_else(|| {
            ConfigError::invalid_value(SECTION, "Add an [images] table to fob.toml")
        })?;
        if !images.is_table() {
            return Err(ConfigError::invalid_value(SECTION, "expected a table"));
        }

        let value = serde_json::to_value(images).map_err(|e| {
            ConfigError::invalid_value("toml", format!("TOML to JSON conversion failed: {e}"))
        })?;

        Ok(PluginOptions::resolve(value)?)
    }

    /// Parse options from the `fob.images` field of a package.json document
    pub fn from_json_str(content: &str) -> Result<PluginOptions, ConfigError> {
        let mut parsed: Value = serde_json::from_str(content).map_err(|e| {
            ConfigError::invalid_value("package.json", format!("Invalid JSON: {e}"))
        })?;

        let images = parsed
            .get_mut("fob")
            .and_then(|fob| fob.get_mut(SECTION))
            .map(Value::take)
            .filter(|images| !images.is_null())
            .ok_or_else(|| {
                ConfigError::invalid_value(
                    "fob.images",
                    "Add a 'fob.images' field to your package.json",
                )
            })?;

        Ok(PluginOptions::resolve(images)?)
    }
}

/// Discover and load options from the current directory
pub fn discover() -> Result<PluginOptions, ConfigError> {
    let root = std::env::current_dir()?;
    OptionsDiscovery::new(&root).load()
}
