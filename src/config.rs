// src/config.rs

//! Engine configuration
//!
//! A small optional TOML file selects the manager binary and tunes catalog
//! behavior; everything has a working default so most installs never write
//! one.

use crate::backend::CondaBackend;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Crate-level configuration, loaded from `<config-dir>/caiman/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit manager binary; PATH discovery when unset
    pub binary: Option<PathBuf>,
    /// Whether the configured channels carry description metadata
    pub descriptions: bool,
}

impl Config {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("caiman").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            crate::error::Error::Validation(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// Build the conda backend this config describes
    pub fn backend(&self) -> Result<CondaBackend> {
        let backend = match &self.binary {
            Some(binary) => CondaBackend::new(binary.clone()),
            None => CondaBackend::discover()?,
        };
        Ok(backend.with_descriptions(self.descriptions))
    }
}
