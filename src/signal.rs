// src/signal.rs

//! Workflow state signals and the per-environment broadcast channel
//!
//! Every orchestration workflow announces its phase transitions as
//! [`StateSignal`] snapshots over a [`SignalChannel`]. Signals are
//! point-in-time facts: emitted once, never mutated, delivered in emission
//! order, and not replayed to late subscribers.

use crate::package::Package;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::sync::broadcast;

/// Broadcast capacity per environment channel
///
/// Workflows emit a handful of signals each; a slow observer that falls more
/// than this far behind starts losing the oldest signals (tokio broadcast
/// lag semantics) rather than blocking the engine.
const CHANNEL_CAPACITY: usize = 256;

/// Progress marker for one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Success,
    Error,
}

/// Which subset of packages a mutating workflow targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    All,
    Selected,
}

/// Immutable snapshot broadcast to observers on each phase transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSignal {
    /// Target environment name
    pub environment: String,
    /// Whether a workflow is in flight; callers treat this as a mutex
    /// signal and must not start a second workflow while it is set
    pub is_loading: bool,
    pub phase: Phase,
    /// Current normalized package list (success of a prime run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<Package>>,
    /// OR-aggregate of `updatable` over `packages`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_update: Option<bool>,
    /// Whether the backend serves package descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_description: Option<bool>,
    /// Set by update workflows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<UpdateMode>,
    /// Error detail, set on the error phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StateSignal {
    /// A `starting` signal for the given environment
    pub fn starting(environment: impl Into<String>) -> Self {
        StateSignal {
            environment: environment.into(),
            is_loading: true,
            phase: Phase::Starting,
            packages: None,
            has_update: None,
            has_description: None,
            mode: None,
            message: None,
        }
    }

    /// A bare `success` signal for the given environment
    pub fn success(environment: impl Into<String>) -> Self {
        StateSignal {
            is_loading: false,
            phase: Phase::Success,
            ..StateSignal::starting(environment)
        }
    }

    /// An `error` signal carrying the stringified cause
    pub fn error(environment: impl Into<String>, message: impl Into<String>) -> Self {
        StateSignal {
            is_loading: false,
            phase: Phase::Error,
            message: Some(message.into()),
            ..StateSignal::starting(environment)
        }
    }

    /// Attach an update mode
    pub fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attach a package list with its aggregates
    pub fn with_packages(mut self, packages: Vec<Package>, has_update: bool) -> Self {
        self.packages = Some(packages);
        self.has_update = Some(has_update);
        self
    }

    /// Attach the description capability flag
    pub fn with_description(mut self, has_description: bool) -> Self {
        self.has_description = Some(has_description);
        self
    }
}

/// Per-environment broadcast point for [`StateSignal`]s
///
/// Emission is synchronous fire-and-forget: the engine never waits for
/// observers, and emitting with no subscribers is not an error. Signals on
/// one channel arrive in emission order; there is no history replay.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    tx: broadcast::Sender<StateSignal>,
}

impl SignalChannel {
    /// Create a channel with the default capacity
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        SignalChannel { tx }
    }

    /// Broadcast a signal to all current subscribers
    pub fn emit(&self, signal: StateSignal) {
        // Ignore send errors (no subscribers)
        let _ = self.tx.send(signal);
    }

    /// Subscribe to signals emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StateSignal> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SignalChannel {
    fn default() -> Self {
        Self::new()
    }
}
