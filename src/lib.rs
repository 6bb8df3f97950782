// src/lib.rs

//! Caiman
//!
//! Package-state synchronization and mutation orchestration for conda
//! environments. The crate normalizes heterogeneous package records from an
//! external conda-compatible manager into a canonical shape, derives update
//! availability, and drives the mutating workflows (prime, update-all,
//! update-selected, remove, refresh-available) as orchestrated sequences of
//! facade calls with broadcast state signals.
//!
//! # Architecture
//!
//! - Facade boundary: the external manager sits behind [`backend::PackageBackend`]
//! - One handle per environment: [`manager::PackageManager`] owns that
//!   environment's signal channel, cached in [`manager::ManagerRegistry`]
//! - Signals, not callbacks: workflows broadcast [`signal::StateSignal`]
//!   snapshots; rendering is one observer among others
//! - Repair locally, fail loudly: malformed records are fixed or dropped in
//!   the normalizer, backend failures surface as error signals and re-raise

pub mod backend;
pub mod config;
pub mod engine;
mod error;
pub mod manager;
pub mod observer;
pub mod package;
pub mod selection;
pub mod signal;
pub mod version;

pub use backend::{CondaBackend, Environment, PackageBackend};
pub use config::Config;
pub use engine::{AutoConfirm, Confirmation, DenyAll};
pub use error::{Error, Result};
pub use manager::{ManagerRegistry, PackageManager};
pub use observer::{LogNotifier, Notifier};
pub use package::{Package, PackageStatus, RawPackage};
pub use selection::SelectionModel;
pub use signal::{Phase, SignalChannel, StateSignal, UpdateMode};
