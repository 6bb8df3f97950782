// tests/common/mod.rs

//! Scripted backend and signal helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use caiman::{Environment, Error, PackageBackend, RawPackage, Result, StateSignal};
use serde_json::json;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// One recorded facade call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Refresh { available: bool, env: String },
    Update { specs: Vec<String>, env: String },
    Remove { names: Vec<String>, env: String },
    RefreshAvailable { env: String },
}

/// Backend with canned responses that records every call it receives
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    installed: Vec<Option<RawPackage>>,
    catalog: Vec<Option<RawPackage>>,
    fail_refresh: Option<String>,
    fail_update: Option<String>,
    fail_remove: Option<String>,
    descriptions: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    pub fn with_installed(mut self, installed: Vec<Option<RawPackage>>) -> Self {
        self.installed = installed;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<Option<RawPackage>>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_descriptions(mut self) -> Self {
        self.descriptions = true;
        self
    }

    pub fn fail_refresh(mut self, message: &str) -> Self {
        self.fail_refresh = Some(message.to_string());
        self
    }

    pub fn fail_update(mut self, message: &str) -> Self {
        self.fail_update = Some(message.to_string());
        self
    }

    pub fn fail_remove(mut self, message: &str) -> Self {
        self.fail_remove = Some(message.to_string());
        self
    }

    pub fn recorded(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PackageBackend for MockBackend {
    async fn refresh(&self, available: bool, env: &str) -> Result<Vec<Option<RawPackage>>> {
        self.record(Call::Refresh {
            available,
            env: env.to_string(),
        });
        if let Some(message) = &self.fail_refresh {
            return Err(Error::backend(message.clone()));
        }
        if available {
            Ok(self.catalog.clone())
        } else {
            Ok(self.installed.clone())
        }
    }

    async fn update(&self, specs: &[String], env: &str) -> Result<()> {
        self.record(Call::Update {
            specs: specs.to_vec(),
            env: env.to_string(),
        });
        match &self.fail_update {
            Some(message) => Err(Error::backend(message.clone())),
            None => Ok(()),
        }
    }

    async fn remove(&self, names: &[String], env: &str) -> Result<()> {
        self.record(Call::Remove {
            names: names.to_vec(),
            env: env.to_string(),
        });
        match &self.fail_remove {
            Some(message) => Err(Error::backend(message.clone())),
            None => Ok(()),
        }
    }

    async fn refresh_available_packages(&self, env: &str) -> Result<()> {
        self.record(Call::RefreshAvailable {
            env: env.to_string(),
        });
        Ok(())
    }

    fn has_description(&self) -> bool {
        self.descriptions
    }

    async fn environments(&self) -> Result<Vec<Environment>> {
        Ok(vec![
            Environment {
                name: "base".to_string(),
                dir: "/opt/conda".to_string(),
                is_default: true,
            },
            Environment {
                name: "science".to_string(),
                dir: "/opt/conda/envs/science".to_string(),
                is_default: false,
            },
        ])
    }

    async fn create(&self, _name: &str, _specs: &[String]) -> Result<()> {
        Ok(())
    }

    async fn clone_environment(&self, _source: &str, _target: &str) -> Result<()> {
        Ok(())
    }

    async fn remove_environment(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn export(&self, name: &str) -> Result<String> {
        Ok(format!("name: {}\ndependencies: []\n", name))
    }

    async fn import(&self, _name: &str, _definition: &str) -> Result<()> {
        Ok(())
    }
}

/// Catalog record with the given versions and optional installed version
pub fn raw(name: &str, versions: &[&str], installed: Option<&str>) -> RawPackage {
    RawPackage {
        name: name.to_string(),
        version: json!(versions),
        build_number: json!(vec![0u64; versions.len()]),
        build_string: json!(vec!["py312_0"; versions.len()]),
        summary: Some(format!("{} test package", name)),
        version_installed: installed.map(str::to_string),
        ..RawPackage::default()
    }
}

/// Collect every signal buffered on a receiver
pub fn drain(rx: &mut broadcast::Receiver<StateSignal>) -> Vec<StateSignal> {
    let mut signals = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        signals.push(signal);
    }
    signals
}
