//! Configuration management for the memscan CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use memscan::{Algorithm, ScanScope};

/// Persistent defaults for scan commands.
///
/// Scope and algorithm are stored as their canonical names so the file
/// stays hand-editable.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub scope: Option<String>,
    pub algorithm: Option<String>,
    pub workers: Option<usize>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("memscan");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configured scan scope, if any
    pub fn scan_scope(&self) -> Result<Option<ScanScope>> {
        self.scope
            .as_deref()
            .map(|s| s.parse::<ScanScope>())
            .transpose()
            .context("Invalid scope in config file")
    }

    /// Get the configured search algorithm, if any
    pub fn scan_algorithm(&self) -> Result<Option<Algorithm>> {
        self.algorithm
            .as_deref()
            .map(|s| s.parse::<Algorithm>())
            .transpose()
            .context("Invalid algorithm in config file")
    }

    /// Set the default scan scope
    pub fn set_scope(&mut self, scope: ScanScope) {
        self.scope = Some(scope.to_string());
    }

    /// Set the default search algorithm
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = Some(algorithm.to_string());
    }

    /// Set the fixed parallel worker count
    pub fn set_workers(&mut self, workers: usize) {
        self.workers = Some(workers);
    }
}
