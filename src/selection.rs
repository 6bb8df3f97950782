// src/selection.rs

//! Client-side selection overlay
//!
//! Tracks which packages the user has marked for install/update within one
//! workflow session (a "create environment" or "add packages" interaction),
//! independent of the authoritative package list. The model owns its map
//! outright and never reaches into shared `Package` values.

use crate::package::Package;

/// Ordered map of package name → desired version
///
/// Insertion order is preserved so [`SelectionModel::specs`] produces a
/// deterministic argument list for the external manager.
#[derive(Debug, Default)]
pub struct SelectionModel {
    entries: Vec<(String, String)>,
}

impl SelectionModel {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a package in or out of the selection
    ///
    /// An already-selected package is always removed, regardless of the
    /// stored version. A newly selected one is stored with `version` when
    /// given, otherwise with the newest entry of `pkg.versions`.
    pub fn toggle(&mut self, pkg: &Package, version: Option<&str>) {
        if let Some(pos) = self.position(&pkg.name) {
            self.entries.remove(pos);
        } else {
            let version = version.unwrap_or_else(|| pkg.newest_version());
            self.entries.push((pkg.name.clone(), version.to_string()));
        }
    }

    /// Whether a package name is currently selected
    pub fn is_selected(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Empty the selection
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Selected names, in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// `"name=version"` specs in insertion order, ready for an install or
    /// update argument list
    pub fn specs(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, version)| format!("{}={}", name, version))
            .collect()
    }

    /// Number of selected packages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::test_package;

    #[test]
    fn test_toggle_selects_newest_by_default() {
        let pkg = test_package("numpy", &["1.25.0", "1.26.0"], "");
        let mut sel = SelectionModel::new();

        sel.toggle(&pkg, None);
        assert!(sel.is_selected("numpy"));
        assert_eq!(sel.specs(), vec!["numpy=1.26.0"]);
    }

    #[test]
    fn test_toggle_with_explicit_version() {
        let pkg = test_package("numpy", &["1.25.0", "1.26.0"], "");
        let mut sel = SelectionModel::new();

        sel.toggle(&pkg, Some("1.25.0"));
        assert_eq!(sel.specs(), vec!["numpy=1.25.0"]);
    }

    #[test]
    fn test_toggle_round_trip() {
        let pkg = test_package("numpy", &["1.26.0"], "");
        let mut sel = SelectionModel::new();

        sel.toggle(&pkg, Some("1.25.0"));
        sel.toggle(&pkg, None);
        assert!(sel.is_empty());

        // Re-selecting without a version picks the newest, not the version
        // stored before the round trip
        sel.toggle(&pkg, None);
        assert_eq!(sel.specs(), vec!["numpy=1.26.0"]);
    }

    #[test]
    fn test_toggle_removes_regardless_of_version() {
        let pkg = test_package("numpy", &["1.25.0", "1.26.0"], "");
        let mut sel = SelectionModel::new();

        sel.toggle(&pkg, Some("1.25.0"));
        // Toggle with a different version still deselects
        sel.toggle(&pkg, Some("1.26.0"));
        assert!(!sel.is_selected("numpy"));
    }

    #[test]
    fn test_specs_preserve_insertion_order() {
        let mut sel = SelectionModel::new();
        sel.toggle(&test_package("scipy", &["1.11.0"], ""), None);
        sel.toggle(&test_package("numpy", &["1.26.0"], ""), None);

        assert_eq!(sel.specs(), vec!["scipy=1.11.0", "numpy=1.26.0"]);
        assert_eq!(sel.names(), vec!["scipy", "numpy"]);
    }

    #[test]
    fn test_clear() {
        let mut sel = SelectionModel::new();
        sel.toggle(&test_package("numpy", &["1.26.0"], ""), None);
        assert_eq!(sel.len(), 1);

        sel.clear();
        assert!(sel.is_empty());
    }
}
