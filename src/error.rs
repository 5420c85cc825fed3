//! Error types shared across the interoperability core.
//!
//! Every public operation resolves with its documented shape or fails with one of
//! the [`ApiError`] kinds below, always naming the offending entity.

use thiserror::Error;

/// Errors raised by the repository layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Failed to encode record {id}: {reason}")]
    Encode { id: String, reason: String },
    #[error("Failed to decode record {id}: {reason}")]
    Decode { id: String, reason: String },
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Top-level error for registry, discovery, reputation and protocol operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Operation issued before the owning component finished `initialize()`.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    /// Unknown agent, adapter, thread, connection or capability id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The adapter for `platform` has no implementation of `operation`.
    #[error("Operation '{operation}' is not supported by platform '{platform}'")]
    UnsupportedOperation {
        platform: String,
        operation: &'static str,
    },

    /// Caller protocol violation (inactive capability, double response, ...).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Input is missing a required field or is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The call's cancellation token fired before it completed.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A remote collaborator failed. Discovery never surfaces this kind.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn unsupported(platform: impl Into<String>, operation: &'static str) -> Self {
        Self::UnsupportedOperation {
            platform: platform.into(),
            operation,
        }
    }

    /// Recoverable by initializing the owning component and retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotInitialized(_))
    }

    /// Signals a caller protocol violation rather than a transient fault.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::InvalidState(_) | Self::Validation(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
