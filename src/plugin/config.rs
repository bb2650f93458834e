//! Plugin enable policy loaded from `~/.config/stylescout/plugins.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Which plugins a run uses when the caller does not name them.
///
/// Only `enabled_extractors` is enforced. `enabled_generators` is accepted so
/// config files stay symmetric, but every registered generator stays
/// available regardless of it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PluginConfig {
    /// Extractor allow-list. Empty means every registered extractor.
    #[serde(default)]
    pub enabled_extractors: Vec<String>,
    /// Generator list. Parsed but not enforced.
    #[serde(default)]
    pub enabled_generators: Vec<String>,
}

impl PluginConfig {
    /// Load the policy from the default location.
    ///
    /// Returns the default policy if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load the policy from an explicit path, defaulting when it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No plugin config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

/// Return the path to the plugins config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stylescout")
        .join("plugins.toml")
}
