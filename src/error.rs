//! Error types for a3s-alert

use thiserror::Error;

/// Errors that can occur in the alert core
#[derive(Debug, Error)]
pub enum AlertError {
    /// Malformed or missing required input (finding shape, status value)
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown alert id
    #[error("Alert not found: {0}")]
    NotFound(String),

    /// An alert with the same id is already stored
    #[error("Alert with id {0} already exists")]
    DuplicateKey(String),

    /// Status change not permitted from the current state
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for alert operations
pub type Result<T> = std::result::Result<T, AlertError>;
