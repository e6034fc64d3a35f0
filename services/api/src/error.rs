//! services/api/src/error.rs
//!
//! Defines the startup error type for the API service. Per-request failures use
//! `lexibot_core::ChatError` instead; see `web::errors`.

use crate::config::ConfigError;

/// The primary error type for starting and running the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
