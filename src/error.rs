//! Error types for Luatbot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Luatbot operations
///
/// Only `Config` and `MissingCredentials` are fatal, and only at startup.
/// Every other variant is recovered where it occurs: persistence failures
/// reset to an empty history, network and response failures become the
/// fallback apology message, and validation failures are dropped silently.
#[derive(Error, Debug)]
pub enum LuatbotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion credential was not supplied
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Stored history could not be read, parsed, or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The completion endpoint could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The completion endpoint replied with a failure status or an unusable body
    #[error("Response error: {0}")]
    Response(String),

    /// Outgoing message rejected before any state change
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LuatbotError {
    /// Whether this error came from the remote completion call
    pub fn is_completion_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Response(_))
    }
}

/// Result type alias for Luatbot operations
pub type Result<T> = anyhow::Result<T>;
