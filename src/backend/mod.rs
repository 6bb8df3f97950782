// src/backend/mod.rs

//! Facade boundary to the external package manager
//!
//! Everything the engine needs from conda/mamba is expressed as the
//! [`PackageBackend`] trait; the production implementation shells out to the
//! manager CLI, tests substitute a scripted mock. Optional capabilities
//! (`refresh_available_packages`, `has_description`) have graceful defaults
//! so the engine never has to probe for their presence.

mod conda;

pub use conda::CondaBackend;

use crate::error::Result;
use crate::package::RawPackage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named, isolated package installation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name (last path component of its prefix)
    pub name: String,
    /// Filesystem prefix of the environment
    pub dir: String,
    /// Whether this is the manager's root/base environment
    pub is_default: bool,
}

/// Asynchronous interface to one external package manager installation
///
/// All operations may fail with [`crate::Error::Backend`] carrying a
/// human-readable message; callers treat such a failure as fatal to the
/// current workflow step and do not retry inside the facade.
#[async_trait]
pub trait PackageBackend: Send + Sync {
    /// List packages for an environment
    ///
    /// `available = false` returns only installed packages; `true` returns
    /// the full catalog (installed and not-yet-installed).
    async fn refresh(&self, available: bool, env: &str) -> Result<Vec<Option<RawPackage>>>;

    /// Apply an update
    ///
    /// `specs` is either `["--all"]` or a list of `"name"` /
    /// `"name=version"` tokens. Returns once the external process completes.
    async fn update(&self, specs: &[String], env: &str) -> Result<()>;

    /// Remove packages from an environment
    async fn remove(&self, names: &[String], env: &str) -> Result<()>;

    /// Invalidate the manager's cached catalog index
    ///
    /// Optional capability; backends without such a notion inherit this
    /// no-op and callers skip gracefully.
    async fn refresh_available_packages(&self, _env: &str) -> Result<()> {
        Ok(())
    }

    /// Whether the backend serves package descriptions usable for search
    fn has_description(&self) -> bool {
        false
    }

    /// List all environments known to the manager
    async fn environments(&self) -> Result<Vec<Environment>>;

    /// Create a new environment with the given package specs
    async fn create(&self, name: &str, specs: &[String]) -> Result<()>;

    /// Clone an existing environment under a new name
    async fn clone_environment(&self, source: &str, target: &str) -> Result<()>;

    /// Delete an environment
    async fn remove_environment(&self, name: &str) -> Result<()>;

    /// Export an environment definition (YAML text)
    async fn export(&self, name: &str) -> Result<String>;

    /// Create an environment from an exported definition
    async fn import(&self, name: &str, definition: &str) -> Result<()>;
}
