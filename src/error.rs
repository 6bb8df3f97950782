// src/error.rs

//! Error types shared across the crate
//!
//! Workflow and facade failures funnel into one [`Error`] enum; external
//! process output is stringified into [`Error::Backend`] so callers and
//! signal observers see one human-readable message per failure.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an argument the engine refuses to act on
    #[error("Validation error: {0}")]
    Validation(String),

    /// The external package manager failed or produced unusable output
    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Backend`] from any printable cause
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }
}
