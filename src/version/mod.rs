// src/version/mod.rs

//! Tolerant version comparison for update detection
//!
//! Conda version strings are frequently not strict semver ("1.26", "2:4.8.1",
//! "2021.05.13", "0.4.post1"). Update detection must never fail on one of
//! them: anything that cannot be coerced into a comparable form simply
//! compares as "not newer".

use semver::Version;

/// Coerce a free-form version string into a comparable `semver::Version`
///
/// Handles the shapes the external manager actually emits:
/// - "1.2.3" → 1.2.3 (strict semver, used directly)
/// - "2:1.2.3" → 1.2.3 (epoch prefix stripped)
/// - "1.26" → 1.26.0 (missing components padded with zeros)
/// - "4.8.1.post2" → 4.8.1 (trailing non-numeric segments ignored)
///
/// Returns `None` when no leading numeric component exists at all.
pub fn coerce(s: &str) -> Option<Version> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Strip an epoch prefix ("2:4.8.1")
    let rest = match s.split_once(':') {
        Some((epoch, rest)) if epoch.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => s,
    };

    // Strip build/release suffixes ("1.2.3-4", "1.11.0+cu118")
    let rest = rest.split(['-', '+', '_', ' ']).next().unwrap_or(rest);

    if let Ok(v) = Version::parse(rest) {
        return Some(v);
    }

    // Extract leading numeric dot components
    let mut nums = [None::<u64>; 3];
    for (i, part) in rest.split('.').take(3).enumerate() {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u64>() {
            Ok(n) => nums[i] = Some(n),
            Err(_) => break,
        }
    }

    nums[0].map(|major| Version::new(major, nums[1].unwrap_or(0), nums[2].unwrap_or(0)))
}

/// Check whether `candidate` is strictly newer than `baseline`
///
/// Returns `false` when either side fails to coerce: a malformed version
/// string means "no update available", never an error.
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    match (coerce(candidate), coerce(baseline)) {
        (Some(c), Some(b)) => c > b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_strict_semver() {
        assert_eq!(coerce("1.2.3"), Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_coerce_partial_version() {
        assert_eq!(coerce("1.26"), Some(Version::new(1, 26, 0)));
        assert_eq!(coerce("3"), Some(Version::new(3, 0, 0)));
    }

    #[test]
    fn test_coerce_epoch_prefix() {
        assert_eq!(coerce("2:4.8.1"), Some(Version::new(4, 8, 1)));
    }

    #[test]
    fn test_coerce_trailing_tags() {
        assert_eq!(coerce("1.2.3-py39"), Some(Version::new(1, 2, 3)));
        assert_eq!(coerce("4.8.1.post2"), Some(Version::new(4, 8, 1)));
        assert_eq!(coerce("1.11.0+cu118"), Some(Version::new(1, 11, 0)));
    }

    #[test]
    fn test_coerce_calendar_version() {
        assert_eq!(coerce("2021.05.13"), Some(Version::new(2021, 5, 13)));
    }

    #[test]
    fn test_coerce_malformed() {
        assert_eq!(coerce(""), None);
        assert_eq!(coerce("latest"), None);
        assert_eq!(coerce("py39_0"), None);
    }

    #[test]
    fn test_is_newer_basic() {
        assert!(is_newer("1.26.1", "1.26.0"));
        assert!(!is_newer("1.26.0", "1.26.0"));
        assert!(!is_newer("1.25.9", "1.26.0"));
    }

    #[test]
    fn test_is_newer_mixed_precision() {
        assert!(is_newer("2.0", "1.9.9"));
        assert!(!is_newer("1.9", "1.9.0"));
    }

    #[test]
    fn test_is_newer_malformed_never_updates() {
        assert!(!is_newer("latest", "1.0.0"));
        assert!(!is_newer("1.0.1", "unknown"));
        assert!(!is_newer("", ""));
    }
}
