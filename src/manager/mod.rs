// src/manager/mod.rs

//! Per-environment handles and their registry
//!
//! A [`PackageManager`] binds one environment name to the shared backend and
//! owns that environment's signal channel. Handles are created on first use
//! through [`ManagerRegistry`] and cached until explicitly invalidated, so
//! every workflow and observer for one environment shares one channel.

use crate::backend::{Environment, PackageBackend};
use crate::error::{Error, Result};
use crate::package::RawPackage;
use crate::signal::{SignalChannel, StateSignal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Handle for one environment: backend operations plus the signal channel
pub struct PackageManager {
    env: String,
    backend: Arc<dyn PackageBackend>,
    channel: SignalChannel,
}

impl PackageManager {
    fn new(env: String, backend: Arc<dyn PackageBackend>) -> Self {
        PackageManager {
            env,
            backend,
            channel: SignalChannel::new(),
        }
    }

    /// The environment this handle is bound to
    pub fn env(&self) -> &str {
        &self.env
    }

    /// List packages; `available = true` returns the full catalog
    pub async fn refresh(&self, available: bool) -> Result<Vec<Option<RawPackage>>> {
        self.backend.refresh(available, &self.env).await
    }

    /// Apply an update (`["--all"]` or name/name=version tokens)
    pub async fn update(&self, specs: &[String]) -> Result<()> {
        self.backend.update(specs, &self.env).await
    }

    /// Remove packages
    pub async fn remove(&self, names: &[String]) -> Result<()> {
        self.backend.remove(names, &self.env).await
    }

    /// Invalidate the manager's catalog cache (no-op when unsupported)
    pub async fn refresh_available_packages(&self) -> Result<()> {
        self.backend.refresh_available_packages(&self.env).await
    }

    /// Whether the backend serves package descriptions
    pub fn has_description(&self) -> bool {
        self.backend.has_description()
    }

    /// Broadcast a state signal to this environment's observers
    pub fn emit_state(&self, signal: StateSignal) {
        self.channel.emit(signal);
    }

    /// Subscribe to this environment's state signals
    pub fn subscribe(&self) -> broadcast::Receiver<StateSignal> {
        self.channel.subscribe()
    }
}

/// Explicit cache of per-environment handles
///
/// Owned by the application context (the CLI builds one per invocation,
/// tests build one per case); there is no process-global state, so teardown
/// is dropping the registry.
pub struct ManagerRegistry {
    backend: Arc<dyn PackageBackend>,
    managers: Mutex<HashMap<String, Arc<PackageManager>>>,
}

impl ManagerRegistry {
    /// Create a registry over a backend
    pub fn new(backend: Arc<dyn PackageBackend>) -> Self {
        ManagerRegistry {
            backend,
            managers: Mutex::new(HashMap::new()),
        }
    }

    /// Get the handle for an environment, creating it on first use
    ///
    /// An empty environment name is rejected before any handle exists;
    /// workflows must never run against an unresolved target.
    pub fn get_or_create(&self, env: &str) -> Result<Arc<PackageManager>> {
        if env.is_empty() {
            return Err(Error::Validation(
                "environment name must not be empty".to_string(),
            ));
        }

        let mut managers = self.managers.lock().expect("manager registry poisoned");
        let manager = managers
            .entry(env.to_string())
            .or_insert_with(|| Arc::new(PackageManager::new(env.to_string(), self.backend.clone())));
        Ok(manager.clone())
    }

    /// Drop the cached handle for an environment
    ///
    /// Call when the environment itself is removed; a later `get_or_create`
    /// builds a fresh handle with a fresh channel.
    pub fn invalidate(&self, env: &str) {
        self.managers
            .lock()
            .expect("manager registry poisoned")
            .remove(env);
    }

    /// Drop all cached handles
    pub fn clear(&self) {
        self.managers
            .lock()
            .expect("manager registry poisoned")
            .clear();
    }

    /// Number of cached handles
    pub fn len(&self) -> usize {
        self.managers.lock().expect("manager registry poisoned").len()
    }

    /// Whether no handles are cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List environments known to the backend
    pub async fn environments(&self) -> Result<Vec<Environment>> {
        self.backend.environments().await
    }

    /// The shared backend
    pub fn backend(&self) -> &Arc<dyn PackageBackend> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl PackageBackend for NullBackend {
        async fn refresh(&self, _: bool, _: &str) -> Result<Vec<Option<RawPackage>>> {
            Ok(Vec::new())
        }
        async fn update(&self, _: &[String], _: &str) -> Result<()> {
            Ok(())
        }
        async fn remove(&self, _: &[String], _: &str) -> Result<()> {
            Ok(())
        }
        async fn environments(&self) -> Result<Vec<Environment>> {
            Ok(Vec::new())
        }
        async fn create(&self, _: &str, _: &[String]) -> Result<()> {
            Ok(())
        }
        async fn clone_environment(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn remove_environment(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn export(&self, _: &str) -> Result<String> {
            Ok(String::new())
        }
        async fn import(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn registry() -> ManagerRegistry {
        ManagerRegistry::new(Arc::new(NullBackend))
    }

    #[test]
    fn test_get_or_create_caches_handles() {
        let registry = registry();
        let a = registry.get_or_create("base").unwrap();
        let b = registry.get_or_create("base").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_rejects_empty_name() {
        let registry = registry();
        assert!(matches!(
            registry.get_or_create(""),
            Err(Error::Validation(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalidate_builds_fresh_handle() {
        let registry = registry();
        let a = registry.get_or_create("base").unwrap();

        registry.invalidate("base");
        assert!(registry.is_empty());

        let b = registry.get_or_create("base").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_handles_are_per_environment() {
        let registry = registry();
        let base = registry.get_or_create("base").unwrap();
        let science = registry.get_or_create("science").unwrap();

        let mut base_rx = base.subscribe();
        base.emit_state(StateSignal::starting("base"));
        science.emit_state(StateSignal::starting("science"));

        // Only the signal for this handle's channel arrives
        assert_eq!(base_rx.recv().await.unwrap().environment, "base");
        assert!(base_rx.try_recv().is_err());
    }
}
