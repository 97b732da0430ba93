//! Error types for the noip client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for noip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the noip client
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP resolution errors (network failure or unusable body)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Slot store I/O errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// A stored record exists but its content cannot be understood
    #[error("Corrupt state: {0}")]
    CorruptState(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a corrupt state error
    pub fn corrupt_state(msg: impl Into<String>) -> Self {
        Self::CorruptState(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error means a stored record could not be understood
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, Self::CorruptState(_))
    }
}
