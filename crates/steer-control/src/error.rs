//! Error types for the control node

use std::fmt;
use steer_mesh::MeshError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for control operations
pub type ControlResult<T> = Result<T, ControlError>;

/// Setup step that a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    /// Removing the pre-existing agent
    Remove,
    /// Spawning the controlled agent
    Spawn,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupStep::Remove => write!(f, "remove"),
            SetupStep::Spawn => write!(f, "spawn"),
        }
    }
}

/// Errors surfaced by the controller
#[derive(Error, Debug)]
pub enum ControlError {
    /// Process-wide shutdown interrupted a pending wait
    #[error("shutdown requested")]
    ShutdownRequested,

    /// A setup call failed and the configuration asks to abort on failure
    #[error("{step} step failed: {source}")]
    Setup {
        step: SetupStep,
        #[source]
        source: MeshError,
    },

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ControlError {
    /// Whether this error is the orderly shutdown path rather than a failure
    pub fn is_shutdown(&self) -> bool {
        matches!(self, ControlError::ShutdownRequested)
    }
}
