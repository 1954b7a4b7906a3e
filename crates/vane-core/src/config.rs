//! Router configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Loading runs semantic validation after parsing.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Server name reported by route probes
    pub name: String,
    /// Report and ignore a second signal on the same chain step
    pub enforce_single_continuation_call: bool,
    /// Reject mounting a name that is already registered instead of replacing it
    pub reject_duplicate_names: bool,
    /// Prefix of generated names for anonymous handlers (`<prefix>-<n>`)
    pub anonymous_handler_prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            name: "vane".to_string(),
            enforce_single_continuation_call: true,
            reject_duplicate_names: false,
            anonymous_handler_prefix: "handler".to_string(),
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn enforce_single_continuation_call(mut self, enforce: bool) -> Self {
        self.enforce_single_continuation_call = enforce;
        self
    }

    pub fn reject_duplicate_names(mut self, reject: bool) -> Self {
        self.reject_duplicate_names = reject;
        self
    }

    pub fn anonymous_handler_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.anonymous_handler_prefix = prefix.into();
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if self.anonymous_handler_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "anonymous_handler_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
