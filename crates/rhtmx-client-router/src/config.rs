// File: src/config.rs
// Purpose: Router settings parsed from the `[router]` table of a TOML file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::route::clamp_cache_count;

/// Top-level configuration file layout
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouterConfig {
    /// Root prefix all routes live under (e.g., "/app")
    #[serde(default)]
    pub root: Option<String>,

    /// Cache capacity for routes that do not set their own (default: 1)
    #[serde(default = "default_cache_count")]
    pub cache_count: usize,

    /// Whether in-app link clicks are turned into history navigation (default: true)
    #[serde(default = "default_true")]
    pub intercept_links: bool,
}

fn default_cache_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            root: None,
            cache_count: default_cache_count(),
            intercept_links: true,
        }
    }
}

impl RouterConfig {
    /// Load the `[router]` table from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Config::load(path)?.router)
    }

    /// Parse the `[router]` table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(Config::from_toml_str(content)?.router)
    }

    /// Cache capacity, never below 1
    pub fn effective_cache_count(&self) -> usize {
        clamp_cache_count(self.cache_count)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(content).context("Invalid router configuration")?;
        Ok(config)
    }
}
