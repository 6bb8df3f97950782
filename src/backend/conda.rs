// src/backend/conda.rs

//! Conda/mamba CLI implementation of the package backend
//!
//! Shells out to the first manager binary found on PATH (mamba preferred
//! over conda for speed) and parses its `--json` output. The manager
//! process does its own networking and solver work; this module only
//! translates domain operations into argument lists and repairs the output
//! into [`RawPackage`] records.

use crate::backend::{Environment, PackageBackend};
use crate::error::{Error, Result};
use crate::package::RawPackage;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Manager binaries probed on PATH, in preference order
const CANDIDATE_BINARIES: &[&str] = &["mamba", "micromamba", "conda"];

/// One entry of `conda search --json` output
#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    build_number: u64,
    #[serde(default, alias = "build")]
    build_string: String,
}

/// `conda env list --json` output
#[derive(Debug, Deserialize)]
struct EnvList {
    #[serde(default)]
    envs: Vec<String>,
}

/// Package backend driving a conda-compatible CLI
pub struct CondaBackend {
    binary: PathBuf,
    serves_descriptions: bool,
}

impl CondaBackend {
    /// Use a specific manager binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        CondaBackend {
            binary: binary.into(),
            serves_descriptions: false,
        }
    }

    /// Locate a manager binary on PATH
    pub fn discover() -> Result<Self> {
        for candidate in CANDIDATE_BINARIES {
            if let Ok(path) = which::which(candidate) {
                debug!("Using package manager binary: {}", path.display());
                return Ok(CondaBackend::new(path));
            }
        }
        Err(Error::backend(format!(
            "No conda-compatible binary found on PATH (tried: {})",
            CANDIDATE_BINARIES.join(", ")
        )))
    }

    /// Mark this backend as serving package descriptions
    ///
    /// Only meaningful when the configured channels carry summary metadata.
    pub fn with_descriptions(mut self, serves: bool) -> Self {
        self.serves_descriptions = serves;
        self
    }

    /// The manager binary in use
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run the manager with the given arguments, returning stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary).args(args).output().await?;

        if !output.status.success() {
            return Err(Error::backend(format!(
                "{} {} failed: {}",
                self.binary.display(),
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Installed packages for an environment, as raw records
    async fn list_installed(&self, env: &str) -> Result<Vec<Option<RawPackage>>> {
        let stdout = self.run(&["list", "--json", "-n", env]).await?;
        parse_raw_list(&stdout)
    }

    /// Full catalog merged with installed versions
    async fn list_catalog(&self, env: &str) -> Result<Vec<Option<RawPackage>>> {
        let installed = installed_versions(&self.list_installed(env).await?);
        let stdout = self.run(&["search", "*", "--json"]).await?;
        parse_catalog(&stdout, &installed)
    }
}

#[async_trait]
impl PackageBackend for CondaBackend {
    async fn refresh(&self, available: bool, env: &str) -> Result<Vec<Option<RawPackage>>> {
        if available {
            self.list_catalog(env).await
        } else {
            self.list_installed(env).await
        }
    }

    async fn update(&self, specs: &[String], env: &str) -> Result<()> {
        let mut args = vec!["update", "-y", "-q", "--json", "-n", env];
        args.extend(specs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn remove(&self, names: &[String], env: &str) -> Result<()> {
        let mut args = vec!["remove", "-y", "-q", "--json", "-n", env];
        args.extend(names.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn refresh_available_packages(&self, _env: &str) -> Result<()> {
        // Drop the local index cache; the next catalog query re-resolves it
        self.run(&["clean", "-y", "--index-cache"]).await?;
        Ok(())
    }

    fn has_description(&self) -> bool {
        self.serves_descriptions
    }

    async fn environments(&self) -> Result<Vec<Environment>> {
        let stdout = self.run(&["env", "list", "--json"]).await?;
        let listed: EnvList = serde_json::from_str(&stdout)?;
        Ok(listed.envs.iter().map(|p| environment_from_prefix(p)).collect())
    }

    async fn create(&self, name: &str, specs: &[String]) -> Result<()> {
        let mut args = vec!["create", "-y", "-q", "--json", "-n", name];
        args.extend(specs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn clone_environment(&self, source: &str, target: &str) -> Result<()> {
        self.run(&["create", "-y", "-q", "--json", "-n", target, "--clone", source])
            .await?;
        Ok(())
    }

    async fn remove_environment(&self, name: &str) -> Result<()> {
        self.run(&["env", "remove", "-y", "-q", "--json", "-n", name])
            .await?;
        Ok(())
    }

    async fn export(&self, name: &str) -> Result<String> {
        self.run(&["env", "export", "-n", name]).await
    }

    async fn import(&self, name: &str, definition: &str) -> Result<()> {
        // conda env create only reads definitions from a file
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile()?;
        file.write_all(definition.as_bytes())?;
        let path = file.path().to_string_lossy().into_owned();

        self.run(&["env", "create", "-y", "-q", "-n", name, "-f", &path])
            .await?;
        Ok(())
    }
}

/// Parse a JSON array of package records, repairing what can be repaired
///
/// Null entries stay null (the normalizer drops them with a diagnostic);
/// entries that fail to deserialize are degraded to null with a warning
/// here. Anything other than a JSON array is a backend error.
fn parse_raw_list(stdout: &str) -> Result<Vec<Option<RawPackage>>> {
    let values: Vec<Value> = serde_json::from_str(stdout)
        .map_err(|e| Error::backend(format!("Malformed package list from manager: {}", e)))?;

    Ok(values
        .into_iter()
        .map(|value| {
            if value.is_null() {
                return None;
            }
            match serde_json::from_value::<RawPackage>(value) {
                Ok(mut raw) => {
                    // An installed record's scalar version doubles as the
                    // installed version
                    if raw.version_installed.is_none() {
                        if let Value::String(v) = &raw.version {
                            raw.version_installed = Some(v.clone());
                        }
                    }
                    Some(raw)
                }
                Err(e) => {
                    warn!("Skipping malformed package record: {}", e);
                    None
                }
            }
        })
        .collect())
}

/// Collect name → installed version from a raw installed list
fn installed_versions(installed: &[Option<RawPackage>]) -> HashMap<String, String> {
    installed
        .iter()
        .flatten()
        .filter_map(|raw| {
            raw.version_installed
                .as_ref()
                .map(|v| (raw.name.clone(), v.clone()))
        })
        .collect()
}

/// Parse `search --json` output into one raw record per package name
///
/// Search output maps each name to its entries in oldest-to-newest order;
/// that order is preserved in the version arrays. Installed versions are
/// merged in so update detection can run on the catalog alone.
fn parse_catalog(
    stdout: &str,
    installed: &HashMap<String, String>,
) -> Result<Vec<Option<RawPackage>>> {
    let catalog: BTreeMap<String, Vec<SearchEntry>> = serde_json::from_str(stdout)
        .map_err(|e| Error::backend(format!("Malformed catalog from manager: {}", e)))?;

    Ok(catalog
        .into_iter()
        .map(|(name, entries)| {
            let versions: Vec<Value> =
                entries.iter().map(|e| Value::from(e.version.clone())).collect();
            let build_numbers: Vec<Value> =
                entries.iter().map(|e| Value::from(e.build_number)).collect();
            let build_strings: Vec<Value> = entries
                .iter()
                .map(|e| Value::from(e.build_string.clone()))
                .collect();

            Some(RawPackage {
                version_installed: installed.get(&name).cloned(),
                name,
                version: Value::from(versions),
                build_number: Value::from(build_numbers),
                build_string: Value::from(build_strings),
                ..RawPackage::default()
            })
        })
        .collect())
}

/// Derive an [`Environment`] from a manager prefix path
///
/// Named environments live under an `envs/` directory; anything else is the
/// root/base environment.
fn environment_from_prefix(prefix: &str) -> Environment {
    let path = Path::new(prefix);
    let under_envs = path
        .parent()
        .and_then(Path::file_name)
        .map(|d| d == "envs")
        .unwrap_or(false);

    let name = if under_envs {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "base".to_string())
    } else {
        "base".to_string()
    };

    Environment {
        name,
        dir: prefix.to_string(),
        is_default: !under_envs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_list_installed() {
        let stdout = r#"[
            {"name": "numpy", "version": "1.26.0", "build_number": 0, "build_string": "py39_0"},
            null,
            {"name": "scipy", "version": "1.11.0"}
        ]"#;

        let raw = parse_raw_list(stdout).unwrap();
        assert_eq!(raw.len(), 3);
        assert!(raw[1].is_none());

        let numpy = raw[0].as_ref().unwrap();
        assert_eq!(numpy.name, "numpy");
        assert_eq!(numpy.version_installed.as_deref(), Some("1.26.0"));
    }

    #[test]
    fn test_parse_raw_list_rejects_non_array() {
        assert!(parse_raw_list(r#"{"error": "boom"}"#).is_err());
        assert!(parse_raw_list("not json").is_err());
    }

    #[test]
    fn test_parse_catalog_merges_installed_versions() {
        let stdout = r#"{
            "numpy": [
                {"version": "1.25.0", "build_number": 0, "build": "py39_0"},
                {"version": "1.26.0", "build_number": 0, "build": "py39_0"}
            ],
            "pandas": [
                {"version": "2.2.0", "build_number": 1, "build": "py39_1"}
            ]
        }"#;

        let mut installed = HashMap::new();
        installed.insert("numpy".to_string(), "1.25.0".to_string());

        let raw = parse_catalog(stdout, &installed).unwrap();
        assert_eq!(raw.len(), 2);

        let numpy = raw
            .iter()
            .flatten()
            .find(|r| r.name == "numpy")
            .unwrap();
        assert_eq!(numpy.version_installed.as_deref(), Some("1.25.0"));
        assert_eq!(
            numpy.version,
            Value::from(vec!["1.25.0".to_string(), "1.26.0".to_string()])
        );

        let pandas = raw
            .iter()
            .flatten()
            .find(|r| r.name == "pandas")
            .unwrap();
        assert!(pandas.version_installed.is_none());
    }

    #[test]
    fn test_environment_from_prefix() {
        let base = environment_from_prefix("/opt/conda");
        assert_eq!(base.name, "base");
        assert!(base.is_default);

        let named = environment_from_prefix("/opt/conda/envs/science");
        assert_eq!(named.name, "science");
        assert!(!named.is_default);
        assert_eq!(named.dir, "/opt/conda/envs/science");
    }

    #[test]
    fn test_discover_does_not_panic() {
        // PATH may or may not carry a manager binary; either way is fine
        let _ = CondaBackend::discover();
    }
}
