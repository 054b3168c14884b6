//! Core error types for glycolog-core.
//!
//! Every failure is scoped to the operation that produced it: validation
//! problems are caught before any request is sent, store problems leave the
//! local reading list untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for glycolog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether the failure came from talking to the store rather than from
    /// local input or configuration.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CoreError::Store(
                StoreError::Network(_) | StoreError::Timeout { .. } | StoreError::Rejected { .. }
            )
        )
    }
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// A required field was left empty
    #[error("Field '{field}' is required")]
    MissingField { field: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// No reading with this id in the local list
    #[error("No reading with id '{0}'")]
    UnknownReading(String),

    /// Password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Registration step outside 1..=4
    #[error("Unknown registration step: {0}")]
    InvalidStep(u8),
}

impl ValidationError {
    pub(crate) fn missing(field: &str) -> Self {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Errors talking to the remote store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Request could not be sent or no response was received
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// No response within the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Response received with a non-success status
    #[error("Server rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Base URL cannot carry endpoint paths
    #[error("Invalid store URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_includes_status() {
        let err = StoreError::Rejected {
            status: 422,
            message: "value manquante".into(),
        };
        assert_eq!(
            err.to_string(),
            "Server rejected the request (HTTP 422): value manquante"
        );
    }

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::missing("value").into();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField { .. })
        ));
        assert_eq!(err.to_string(), "Validation error: Field 'value' is required");
    }
}
