//! Error types for transport operations

use thiserror::Error;

use crate::types::NameValidationError;

/// Result type for transport operations
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum MeshError {
    /// Connection to the messaging backend failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish a message
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive a message
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Failed to subscribe to a topic
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Message serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Message deserialization failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// No server is currently advertising the service
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The remote call did not complete successfully
    #[error("Call to '{service}' failed: {reason}")]
    CallFailed { service: String, reason: String },

    /// A topic or service name failed validation
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        name: String,
        reason: NameValidationError,
    },

    /// Backend-specific error (Redis, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),
}

impl MeshError {
    /// Wrap a name validation failure together with the offending name
    pub fn invalid_name(name: impl Into<String>, reason: NameValidationError) -> Self {
        MeshError::InvalidName {
            name: name.into(),
            reason,
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for MeshError {
    fn from(err: redis::RedisError) -> Self {
        MeshError::BackendError(err.to_string())
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(err: serde_json::Error) -> Self {
        MeshError::SerializationFailed(err.to_string())
    }
}
