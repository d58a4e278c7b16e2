//! Core name types for topics and services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for name validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// The name string is empty
    Empty,
    /// The name contains only whitespace
    WhitespaceOnly,
    /// The name has leading or trailing whitespace
    LeadingTrailingWhitespace,
    /// The name has an empty segment (`//`, a lone `/`, or a trailing `/`)
    EmptySegment,
    /// The name contains invalid characters
    InvalidCharacters,
}

impl fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::WhitespaceOnly => write!(f, "name cannot be whitespace-only"),
            Self::LeadingTrailingWhitespace => {
                write!(f, "name cannot have leading or trailing whitespace")
            }
            Self::EmptySegment => write!(f, "name cannot contain empty segments"),
            Self::InvalidCharacters => write!(
                f,
                "name segments can only contain alphanumeric characters, hyphens, underscores, and dots"
            ),
        }
    }
}

impl std::error::Error for NameValidationError {}

/// Shared validation for slash-separated graph names.
///
/// An optional leading `/` marks an absolute name; every segment after it
/// must be non-empty.
fn validate_name(s: &str) -> Result<(), NameValidationError> {
    if s.is_empty() {
        return Err(NameValidationError::Empty);
    }

    if s.trim().is_empty() {
        return Err(NameValidationError::WhitespaceOnly);
    }

    if s != s.trim() {
        return Err(NameValidationError::LeadingTrailingWhitespace);
    }

    let body = s.strip_prefix('/').unwrap_or(s);
    for segment in body.split('/') {
        if segment.is_empty() {
            return Err(NameValidationError::EmptySegment);
        }
        if !segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(NameValidationError::InvalidCharacters);
        }
    }

    Ok(())
}

/// Topic name for pub/sub messaging
///
/// Valid topics:
/// - Non-empty, no leading/trailing whitespace
/// - Segments separated by single `/`, optional leading `/`
/// - Segments contain only alphanumerics, hyphens, underscores, dots
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    /// Parse and validate a topic from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use steer_mesh::Topic;
    ///
    /// assert!(Topic::parse("/turtle2/pose").is_ok());
    /// assert!(Topic::parse("cmd_vel").is_ok());
    ///
    /// assert!(Topic::parse("").is_err());
    /// assert!(Topic::parse("/turtle2//pose").is_err());
    /// assert!(Topic::parse("/turtle2/pose/").is_err());
    /// assert!(Topic::parse("/turtle 2/pose").is_err());
    /// ```
    pub fn parse(topic: impl AsRef<str>) -> Result<Self, NameValidationError> {
        let s = topic.as_ref();
        validate_name(s)?;
        Ok(Self(s.to_string()))
    }

    /// Build an absolute topic scoped under an agent name, e.g. `/turtle2/pose`
    pub fn scoped(agent: &str, leaf: &str) -> Result<Self, NameValidationError> {
        Self::parse(format!("/{agent}/{leaf}"))
    }

    /// Get the topic as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Topic {
    type Err = NameValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a remote service endpoint (e.g. `kill`, `spawn`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Parse and validate a service name
    ///
    /// # Examples
    ///
    /// ```
    /// use steer_mesh::ServiceName;
    ///
    /// assert!(ServiceName::parse("kill").is_ok());
    /// assert!(ServiceName::parse("/sim/spawn").is_ok());
    /// assert!(ServiceName::parse("kill me").is_err());
    /// ```
    pub fn parse(name: impl AsRef<str>) -> Result<Self, NameValidationError> {
        let s = name.as_ref();
        validate_name(s)?;
        Ok(Self(s.to_string()))
    }

    /// Get the service name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ServiceName {
    type Err = NameValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
