// src/package/mod.rs

//! Canonical package model and list helpers
//!
//! The external manager reports packages in inconsistent shapes (scalar vs.
//! array version fields, missing metadata, null entries). Everything the
//! rest of the crate touches goes through [`normalize`] first and is then
//! guaranteed to have the field shapes below.

mod normalize;

pub use normalize::{mark_updatable, normalize, RawPackage};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Sentinel marking a package as explicitly not selected for install/update
pub const NONE_SENTINEL: &str = "none";

/// Canonical record for one installable unit in one environment
///
/// Invariants (guaranteed after [`normalize`]):
/// - `versions` is non-empty (falls back to a single empty string)
/// - `build_numbers` and `build_strings` have the same length as `versions`
/// - every text field is present (possibly empty), never absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Unique name within the environment's package universe
    pub name: String,
    /// Available versions as reported by the manager, oldest to newest
    pub versions: Vec<String>,
    /// Build numbers aligned by index to `versions`
    pub build_numbers: Vec<u64>,
    /// Build strings aligned by index to `versions`
    pub build_strings: Vec<String>,
    /// Installed version, empty when not installed
    pub installed_version: String,
    /// User intent; `"none"` when not selected for install/update
    pub selected_version: String,
    /// Whether the newest available version is strictly newer than the
    /// installed one
    pub updatable: bool,
    /// Short description
    pub summary: String,
    /// Project home page
    pub home_url: String,
    /// Search keywords, lowercased
    pub keywords: String,
    /// Search tags, lowercased
    pub tags: String,
}

impl Package {
    /// The newest version the manager reports for this package
    pub fn newest_version(&self) -> &str {
        self.versions.last().map(String::as_str).unwrap_or("")
    }

    /// Whether the package is installed in the environment
    pub fn is_installed(&self) -> bool {
        !self.installed_version.is_empty()
    }

    /// Copy of this package with a different selected version
    ///
    /// Pure update: the original value is left untouched.
    pub fn with_selected_version(&self, version: impl Into<String>) -> Package {
        Package {
            selected_version: version.into(),
            ..self.clone()
        }
    }
}

/// Installation-status filter over a normalized package list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PackageStatus {
    #[default]
    All,
    Installed,
    Available,
    Updatable,
}

/// Filter packages by a case-insensitive search term
///
/// Matches the package name always; summary, keywords, and tags only when
/// the backend provides descriptions (`has_description`).
pub fn filter_by_search(packages: &[Package], term: &str, has_description: bool) -> Vec<Package> {
    if term.is_empty() {
        return packages.to_vec();
    }
    let lower = term.to_lowercase();
    packages
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&lower)
                || (has_description
                    && (p.summary.to_lowercase().contains(&lower)
                        || p.keywords.contains(&lower)
                        || p.tags.contains(&lower)))
        })
        .cloned()
        .collect()
}

/// Filter packages by installation status
pub fn filter_by_status(packages: &[Package], status: PackageStatus) -> Vec<Package> {
    packages
        .iter()
        .filter(|p| match status {
            PackageStatus::All => true,
            PackageStatus::Installed => p.is_installed(),
            PackageStatus::Available => !p.is_installed(),
            PackageStatus::Updatable => p.updatable,
        })
        .cloned()
        .collect()
}

/// Sort packages by name, returning a new list
pub fn sort_by_name(packages: &[Package]) -> Vec<Package> {
    let mut sorted = packages.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

#[cfg(test)]
pub(crate) fn test_package(name: &str, versions: &[&str], installed: &str) -> Package {
    let versions: Vec<String> = versions.iter().map(|s| s.to_string()).collect();
    let n = versions.len().max(1);
    Package {
        name: name.to_string(),
        versions: if versions.is_empty() {
            vec![String::new()]
        } else {
            versions
        },
        build_numbers: vec![0; n],
        build_strings: vec![String::new(); n],
        installed_version: installed.to_string(),
        selected_version: if installed.is_empty() {
            NONE_SENTINEL.to_string()
        } else {
            installed.to_string()
        },
        updatable: false,
        summary: String::new(),
        home_url: String::new(),
        keywords: String::new(),
        tags: String::new(),
    }
}
