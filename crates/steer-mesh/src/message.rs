//! Message envelope carried by every transport

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{MeshError, MeshResult};

/// Metadata key naming where a service reply must be delivered
pub const REPLY_TO_KEY: &str = "reply_to";

/// Metadata key set on a reply when the server failed to handle the request
pub const ERROR_KEY: &str = "error";

/// Unique identifier for a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the message ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message metadata
pub type MessageMetadata = HashMap<String, String>;

/// A message travelling over a topic or a service call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: MessageId,
    /// JSON payload
    pub payload: serde_json::Value,
    /// Message metadata (arbitrary key-value pairs)
    #[serde(default)]
    pub metadata: MessageMetadata,
    /// Timestamp when message was created
    pub timestamp: DateTime<Utc>,
    /// Optional correlation ID for request/reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Message {
    /// Create a new message around a raw JSON payload
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            id: MessageId::new(),
            payload,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Encode a typed value into a new message
    pub fn encode<T: Serialize>(value: &T) -> MeshResult<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Decode the payload into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> MeshResult<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| MeshError::DeserializationFailed(e.to_string()))
    }

    /// Build the reply to this message, correlated by this message's ID
    pub fn reply(&self, payload: serde_json::Value) -> Self {
        Self::new(payload).with_correlation_id(self.id.to_string())
    }

    /// Add metadata to the message
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set correlation ID for request/reply
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Get metadata value by key
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Error reported by a service server, if this is a failed reply
    pub fn error(&self) -> Option<&str> {
        self.get_metadata(ERROR_KEY)
    }

    /// Serialize message to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
