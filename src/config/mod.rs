//! Configuration loading and management

use crate::core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site-wide settings
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Application name of the URL group
    pub app_name: String,

    /// Namespace used in qualified route names (`namespace:name`)
    pub namespace: String,

    /// Path every admin route is mounted under
    pub mount_path: String,

    /// Rows per page for handlers that do not set their own
    pub per_page: usize,

    /// Number of numbered page links shown at once
    pub max_pager: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            app_name: "stark".to_string(),
            namespace: "stark".to_string(),
            mount_path: "/stark/".to_string(),
            per_page: 10,
            max_pager: 11,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config.normalized())
    }

    /// Mount path with exactly one leading and one trailing slash
    fn normalized(mut self) -> Self {
        let trimmed = self.mount_path.trim_matches('/');
        self.mount_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
        self
    }
}
