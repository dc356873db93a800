//! Configuration Management
//!
//! Handles persistent configuration storage for trender.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::DEFAULT_BASE_URL;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "RENDER_API_KEY";
/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "RENDER_API_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Render API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API base URL, for proxies or staging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Service used by `logs` and `deploy` when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_service: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trender").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file; missing or invalid files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective API key (CLI > env > config)
    pub fn effective_api_key(&self, cli: Option<&str>) -> Option<String> {
        pick(cli, std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    /// Get effective base URL (CLI > env > config > public API)
    pub fn effective_base_url(&self, cli: Option<&str>) -> String {
        pick(cli, std::env::var(BASE_URL_ENV).ok(), self.base_url.as_deref())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

/// First non-blank value in precedence order
fn pick(cli: Option<&str>, env: Option<String>, config: Option<&str>) -> Option<String> {
    [cli.map(str::to_string), env, config.map(str::to_string)]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}
