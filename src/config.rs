//! Builder configuration, optionally loaded from TOML
//!
//! ```toml
//! interval_ms = 250
//! escape_values = true
//! extra_tags = ["span", "a"]
//! root = "#app"
//!
//! [data]
//! app_name = "Builder"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::dom::markup::is_valid_tag_name;
use crate::tags::TagAllowlist;

/// Default templating period
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    /// An `extra_tags` entry the markup parser could not read back
    #[error("Invalid extra tag name '{tag}': expected a letter followed by letters, digits or '-'")]
    InvalidTagError { tag: String },
}

/// Configuration for a [`crate::Builder`]
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Period between templating ticks
    pub interval: Duration,
    /// Escape registry values so they always read as literal text
    pub escape_values: bool,
    /// Tag names allowed in addition to the default table
    pub extra_tags: Vec<String>,
    /// Initial registry entries
    pub data: BTreeMap<String, String>,
    /// Selector for the initial root anchor
    pub root: Option<String>,
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    interval_ms: Option<u64>,
    escape_values: Option<bool>,
    #[serde(default)]
    extra_tags: Vec<String>,
    #[serde(default)]
    data: BTreeMap<String, String>,
    root: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            escape_values: true,
            extra_tags: Vec::new(),
            data: BTreeMap::new(),
            root: None,
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        if let Some(tag) = parsed.extra_tags.iter().find(|tag| !is_valid_tag_name(tag)) {
            return Err(ConfigError::InvalidTagError { tag: tag.clone() });
        }
        let defaults = Self::default();

        Ok(Self {
            interval: parsed
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            escape_values: parsed.escape_values.unwrap_or(defaults.escape_values),
            extra_tags: parsed.extra_tags,
            data: parsed.data,
            root: parsed.root,
        })
    }

    /// Set the templating period
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable escaping of substituted values
    pub fn with_escape_values(mut self, escape: bool) -> Self {
        self.escape_values = escape;
        self
    }

    /// Allow an extra tag name; names that are not valid markup are skipped
    /// when the allow-list is built
    pub fn with_extra_tag(mut self, tag: impl Into<String>) -> Self {
        self.extra_tags.push(tag.into());
        self
    }

    /// Seed one registry entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set the initial root selector
    pub fn with_root(mut self, selector: impl Into<String>) -> Self {
        self.root = Some(selector.into());
        self
    }

    /// The allow-list implied by this configuration
    pub fn tag_allowlist(&self) -> TagAllowlist {
        TagAllowlist::default().with_extra(self.extra_tags.iter().cloned())
    }
}
