// src/package/normalize.rs

//! Normalization of raw manager records into canonical [`Package`] values
//!
//! Raw records come straight from the external manager's JSON output and
//! carry no guarantees: version fields may be scalars or arrays, metadata
//! may be missing, whole entries may be null. Normalization repairs or
//! drops locally; it never fails.

use super::{Package, NONE_SENTINEL};
use crate::version::is_newer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Home URL substituted when the manager reports none
const DEFAULT_HOME_URL: &str = "https://repo.anaconda.com/pkgs/main/";

/// Permissive mirror of whatever the external manager emits for one package
///
/// Every field is optional or polymorphic; deserializing a malformed record
/// must not fail the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPackage {
    #[serde(default)]
    pub name: String,
    /// Scalar or array of version strings
    #[serde(default)]
    pub version: Value,
    /// Scalar or array of build numbers
    #[serde(default)]
    pub build_number: Value,
    /// Scalar or array of build strings
    #[serde(default)]
    pub build_string: Value,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    /// String or array; coerced to a lowercased string
    #[serde(default)]
    pub keywords: Value,
    /// String or array; coerced to a lowercased string
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub version_installed: Option<String>,
    #[serde(default)]
    pub version_selected: Option<String>,
    #[serde(default)]
    pub updatable: Option<bool>,
}

impl From<&Package> for RawPackage {
    fn from(pkg: &Package) -> Self {
        RawPackage {
            name: pkg.name.clone(),
            version: Value::from(pkg.versions.clone()),
            build_number: Value::from(pkg.build_numbers.clone()),
            build_string: Value::from(pkg.build_strings.clone()),
            summary: Some(pkg.summary.clone()),
            home: Some(pkg.home_url.clone()),
            keywords: Value::from(pkg.keywords.clone()),
            tags: Value::from(pkg.tags.clone()),
            version_installed: Some(pkg.installed_version.clone()),
            version_selected: Some(pkg.selected_version.clone()),
            updatable: Some(pkg.updatable),
        }
    }
}

/// Coerce a JSON value to one string (null → empty, arrays comma-joined)
fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Coerce a JSON value to a vector of strings, one entry minimum
fn string_vec(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                vec![String::new()]
            } else {
                items.iter().map(scalar_string).collect()
            }
        }
        other => vec![scalar_string(other)],
    }
}

/// Coerce a JSON value to one build number (anything non-numeric → 0)
fn scalar_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerce a JSON value to a vector of build numbers, one entry minimum
fn u64_vec(value: &Value) -> Vec<u64> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                vec![0]
            } else {
                items.iter().map(scalar_u64).collect()
            }
        }
        other => vec![scalar_u64(other)],
    }
}

/// Normalize raw manager records into canonical packages
///
/// Null entries and records without a name are dropped with a diagnostic.
/// The output satisfies every invariant documented on [`Package`], and the
/// function is idempotent: re-normalizing a normalized list is a no-op.
pub fn normalize(raw: Vec<Option<RawPackage>>) -> Vec<Package> {
    raw.into_iter()
        .filter_map(|entry| {
            let Some(raw) = entry else {
                warn!("normalize: dropping null package entry");
                return None;
            };
            if raw.name.is_empty() {
                warn!("normalize: dropping package entry without a name");
                return None;
            }
            Some(normalize_one(raw))
        })
        .collect()
}

fn normalize_one(raw: RawPackage) -> Package {
    let versions = string_vec(&raw.version);

    let mut build_numbers = u64_vec(&raw.build_number);
    build_numbers.resize(versions.len(), 0);

    let mut build_strings = string_vec(&raw.build_string);
    build_strings.resize(versions.len(), String::new());

    let installed_version = raw.version_installed.unwrap_or_default();
    let selected_version = match raw.version_selected {
        Some(v) => v,
        None if !installed_version.is_empty() => installed_version.clone(),
        None => NONE_SENTINEL.to_string(),
    };

    let home_url = match raw.home {
        Some(h) if !h.is_empty() => h,
        _ => DEFAULT_HOME_URL.to_string(),
    };

    Package {
        name: raw.name,
        versions,
        build_numbers,
        build_strings,
        installed_version,
        selected_version,
        updatable: raw.updatable.unwrap_or(false),
        summary: raw.summary.unwrap_or_default(),
        home_url,
        keywords: scalar_string(&raw.keywords).to_lowercase(),
        tags: scalar_string(&raw.tags).to_lowercase(),
    }
}

/// Derive the `updatable` flag for every package and aggregate `has_update`
///
/// A package is updatable iff it is installed and the newest entry of its
/// version list compares strictly greater than the installed version.
/// Malformed version strings never mark a package updatable.
pub fn mark_updatable(packages: Vec<Package>) -> (Vec<Package>, bool) {
    let mut has_update = false;
    let list = packages
        .into_iter()
        .map(|mut pkg| {
            pkg.updatable =
                pkg.is_installed() && is_newer(pkg.newest_version(), &pkg.installed_version);
            has_update |= pkg.updatable;
            pkg
        })
        .collect();
    (list, has_update)
}
