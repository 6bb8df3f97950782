// src/engine/mod.rs

//! Orchestration workflows over the package-manager facade
//!
//! Each entry point is one state-machine run for one environment:
//! `idle → starting → (success | error)`, announced as [`StateSignal`]s on
//! that environment's channel. Terminal states are not retried; a failed
//! workflow emits its error signal and re-raises to the caller. Within one
//! call site workflows run strictly sequentially; the engine takes no locks
//! across call sites, so callers must treat `is_loading` as a mutex signal.

use crate::error::{Error, Result};
use crate::manager::{ManagerRegistry, PackageManager};
use crate::package::{mark_updatable, normalize, NONE_SENTINEL};
use crate::signal::{StateSignal, UpdateMode};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Yes/no prompt boundary gating destructive bulk operations
///
/// Cancellation is an answer, not an error: a declined confirmation makes
/// the workflow a silent no-op.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, title: &str, body: &str) -> bool;
}

/// Accepts every confirmation (scripted/non-interactive use)
pub struct AutoConfirm;

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        true
    }
}

/// Declines every confirmation
pub struct DenyAll;

#[async_trait]
impl Confirmation for DenyAll {
    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        false
    }
}

/// Refresh the packages view (installed + available) and emit the result
///
/// Emits `starting`, queries the facade for installed then available
/// packages, and emits one `success` carrying the normalized catalog with
/// `updatable` derived per package. An empty catalog is a valid terminal
/// state (offline index), reported as `success` with an empty list. Any
/// facade failure emits `error` with the stringified cause and re-raises.
pub async fn prime(registry: &ManagerRegistry, env: &str) -> Result<()> {
    let pm = registry.get_or_create(env)?;
    prime_on(&pm).await
}

async fn prime_on(pm: &PackageManager) -> Result<()> {
    let env = pm.env();
    pm.emit_state(StateSignal::starting(env));

    let outcome = async {
        let installed = pm.refresh(false).await?;
        debug!("prime: {} installed records in '{}'", installed.len(), env);
        pm.refresh(true).await
    }
    .await;

    let available = match outcome {
        Ok(available) => available,
        Err(e) => {
            pm.emit_state(StateSignal::error(env, e.to_string()));
            return Err(e);
        }
    };

    if available.is_empty() {
        warn!("prime: empty catalog for '{}'", env);
        pm.emit_state(
            StateSignal::success(env)
                .with_packages(Vec::new(), false)
                .with_description(pm.has_description()),
        );
        return Ok(());
    }

    let (list, has_update) = mark_updatable(normalize(available));
    debug!(
        "prime: {} packages in '{}', has_update={}",
        list.len(),
        env,
        has_update
    );

    pm.emit_state(
        StateSignal::success(env)
            .with_packages(list, has_update)
            .with_description(pm.has_description()),
    );
    Ok(())
}

/// Build the update argument list for a mode
///
/// `All` maps to `["--all"]`. `Selected` maps each name to
/// `"name=version"` when a non-sentinel version is supplied at the matching
/// index, else the bare name.
pub fn build_update_specs(
    mode: UpdateMode,
    names: &[String],
    versions: Option<&[String]>,
) -> Vec<String> {
    match mode {
        UpdateMode::All => vec!["--all".to_string()],
        UpdateMode::Selected => names
            .iter()
            .enumerate()
            .map(|(i, name)| match versions.and_then(|v| v.get(i)) {
                Some(v) if !v.is_empty() && v != NONE_SENTINEL => format!("{}={}", name, v),
                _ => name.clone(),
            })
            .collect(),
    }
}

/// Update all packages or a selected subset, then re-synchronize
///
/// On success the engine unconditionally re-runs [`prime`]: the manager may
/// have changed dependent package versions as a side effect, so the updated
/// set is never assumed exhaustive. On failure the `error` signal carries
/// the mode and the stringified cause, and the error re-raises.
pub async fn update_packages(
    registry: &ManagerRegistry,
    env: &str,
    mode: UpdateMode,
    names: &[String],
    versions: Option<&[String]>,
) -> Result<()> {
    let pm = registry.get_or_create(env)?;
    pm.emit_state(StateSignal::starting(env).with_mode(mode));

    let specs = build_update_specs(mode, names, versions);
    debug!("update: mode={} specs={:?} env='{}'", mode, specs, env);

    if let Err(e) = pm.update(&specs).await {
        pm.emit_state(StateSignal::error(env, e.to_string()).with_mode(mode));
        return Err(e);
    }

    pm.emit_state(StateSignal::success(env).with_mode(mode));

    prime_on(&pm).await
}

/// Update all packages after an explicit confirmation
///
/// A declined confirmation is a no-op: no signal, no error.
pub async fn confirm_and_update_all(
    registry: &ManagerRegistry,
    env: &str,
    confirmation: &dyn Confirmation,
) -> Result<()> {
    // Resolve the handle first so an invalid environment is rejected
    // before the user is prompted
    let _ = registry.get_or_create(env)?;

    let accepted = confirmation
        .confirm(
            "Update all",
            &format!(
                "Update all packages in '{}'? The manager enforces environment \
                 consistency, so only a subset of updates may be applied.",
                env
            ),
        )
        .await;

    if !accepted {
        info!("update-all cancelled for '{}'", env);
        return Ok(());
    }

    update_packages(registry, env, UpdateMode::All, &[], None).await
}

/// Invalidate the available-package cache and re-prime
///
/// Backends without the capability no-op the invalidation; the re-prime
/// still runs so observers get a fresh catalog either way.
pub async fn refresh_available(registry: &ManagerRegistry, env: &str) -> Result<()> {
    let pm = registry.get_or_create(env)?;
    pm.emit_state(StateSignal::starting(env));

    if let Err(e) = pm.refresh_available_packages().await {
        pm.emit_state(StateSignal::error(env, e.to_string()));
        return Err(e);
    }

    pm.emit_state(StateSignal::success(env));

    prime_on(&pm).await
}

/// Remove packages from an environment
///
/// Does not re-prime automatically; the caller decides whether to refresh.
pub async fn remove_packages(
    registry: &ManagerRegistry,
    env: &str,
    names: &[String],
) -> Result<()> {
    let pm = registry.get_or_create(env)?;
    if names.is_empty() {
        return Err(Error::Validation(
            "remove requires at least one package name".to_string(),
        ));
    }

    pm.emit_state(StateSignal::starting(env));

    if let Err(e) = pm.remove(names).await {
        pm.emit_state(StateSignal::error(env, e.to_string()));
        return Err(e);
    }

    pm.emit_state(StateSignal::success(env));
    Ok(())
}

/// Announce an intended batch modification
///
/// Announce-only by design: observers get one `starting` signal carrying
/// the mode, no mutating facade operation runs, and no terminal phase is
/// emitted. Callers needing transactional behavior use
/// [`update_packages`].
pub async fn apply_modifications(
    registry: &ManagerRegistry,
    env: &str,
    mode: UpdateMode,
    names: &[String],
) -> Result<()> {
    let pm = registry.get_or_create(env)?;
    pm.emit_state(StateSignal::starting(env).with_mode(mode));

    match mode {
        UpdateMode::All => info!("preparing modification of all packages in '{}'", env),
        UpdateMode::Selected => info!(
            "preparing modification of {} package(s) in '{}': {:?}",
            names.len(),
            env,
            names
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_update_specs_all() {
        assert_eq!(
            build_update_specs(UpdateMode::All, &strings(&["ignored"]), None),
            vec!["--all"]
        );
    }

    #[test]
    fn test_build_update_specs_selected_with_versions() {
        let specs = build_update_specs(
            UpdateMode::Selected,
            &strings(&["numpy", "scipy"]),
            Some(&strings(&["1.26.0", "none"])),
        );
        assert_eq!(specs, vec!["numpy=1.26.0", "scipy"]);
    }

    #[test]
    fn test_build_update_specs_selected_without_versions() {
        let specs = build_update_specs(UpdateMode::Selected, &strings(&["numpy", "scipy"]), None);
        assert_eq!(specs, vec!["numpy", "scipy"]);
    }

    #[test]
    fn test_build_update_specs_ragged_versions() {
        // Fewer versions than names: the tail falls back to bare names
        let specs = build_update_specs(
            UpdateMode::Selected,
            &strings(&["numpy", "scipy", "pandas"]),
            Some(&strings(&["1.26.0"])),
        );
        assert_eq!(specs, vec!["numpy=1.26.0", "scipy", "pandas"]);
    }

    #[test]
    fn test_build_update_specs_empty_version_is_bare() {
        let specs = build_update_specs(
            UpdateMode::Selected,
            &strings(&["numpy"]),
            Some(&strings(&[""])),
        );
        assert_eq!(specs, vec!["numpy"]);
    }
}
