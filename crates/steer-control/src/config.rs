//! # Environment-Based Configuration
//!
//! Defaults reproduce the fixed setup: remove `turtle1`, spawn `turtle2` at
//! (2.0, 1.0, 0.0), poll services every second, steer with thresholds
//! 2.0/9.0. Every value can be overridden from the environment.
//!
//! ## Environment Variables
//!
//! - `TURTLE_NODE_NAME` - Node name used in logs (default: my_controller)
//! - `TURTLE_REMOVE_NAME` - Agent removed at startup (default: turtle1)
//! - `TURTLE_SPAWN_NAME` - Agent spawned and controlled (default: turtle2)
//! - `TURTLE_SPAWN_X` / `TURTLE_SPAWN_Y` / `TURTLE_SPAWN_THETA` - Spawn pose (default: 2.0 / 1.0 / 0.0)
//! - `TURTLE_KILL_SERVICE` - Removal service name (default: kill)
//! - `TURTLE_SPAWN_SERVICE` - Spawn service name (default: spawn)
//! - `TURTLE_SERVICE_POLL_SECS` - Service readiness poll interval (default: 1)
//! - `TURTLE_STEER_LOWER_X` / `TURTLE_STEER_UPPER_X` - Corridor thresholds (default: 2.0 / 9.0)
//! - `TURTLE_STEER_TURN_RATE` - Yaw rate outside the corridor (default: 4.0)
//! - `TURTLE_STEER_FORWARD_SPEED` - Forward speed (default: 1.0)
//! - `TURTLE_ABORT_ON_SETUP_FAILURE` - Stop instead of continuing when a setup call fails (default: false)

use std::{env, time::Duration};
use steer_mesh::{ServiceName, Topic};

use crate::steering::SteeringPolicy;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Name and initial pose of the agent to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPose {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Default for SpawnPose {
    fn default() -> Self {
        Self {
            name: "turtle2".to_string(),
            x: 2.0,
            y: 1.0,
            theta: 0.0,
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub node_name: String,
    pub remove_name: String,
    pub spawn: SpawnPose,
    pub kill_service: ServiceName,
    pub spawn_service: ServiceName,
    pub service_poll_interval: Duration,
    pub policy: SteeringPolicy,
    pub abort_on_setup_failure: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            node_name: "my_controller".to_string(),
            remove_name: "turtle1".to_string(),
            spawn: SpawnPose::default(),
            kill_service: default_service("kill"),
            spawn_service: default_service("spawn"),
            service_poll_interval: Duration::from_secs(1),
            policy: SteeringPolicy::default(),
            abort_on_setup_failure: false,
        }
    }
}

fn default_service(name: &'static str) -> ServiceName {
    ServiceName::parse(name).unwrap_or_else(|e| panic!("built-in service name '{name}': {e}"))
}

impl ControllerConfig {
    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "node name cannot be empty".to_string(),
            ));
        }
        // Agent names end up as topic segments
        for (what, name) in [
            ("remove", &self.remove_name),
            ("spawn", &self.spawn.name),
        ] {
            Topic::scoped(name, "pose").map_err(|e| {
                ConfigError::ValidationError(format!("invalid {what} agent name '{name}': {e}"))
            })?;
        }
        if self.remove_name == self.spawn.name {
            return Err(ConfigError::ValidationError(format!(
                "remove and spawn agent names must differ (both '{}')",
                self.spawn.name
            )));
        }
        if [self.spawn.x, self.spawn.y, self.spawn.theta]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(ConfigError::ValidationError(
                "spawn pose must be finite".to_string(),
            ));
        }
        if self.service_poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "service poll interval must be greater than 0".to_string(),
            ));
        }
        self.policy.validate().map_err(ConfigError::ValidationError)
    }
}

/// Builder for `ControllerConfig` with environment variable support
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(name) = get_env_string("TURTLE_NODE_NAME") {
            builder = builder.node_name(name);
        }
        if let Some(name) = get_env_string("TURTLE_REMOVE_NAME") {
            builder = builder.remove_name(name);
        }

        let mut spawn = SpawnPose::default();
        if let Some(name) = get_env_string("TURTLE_SPAWN_NAME") {
            spawn.name = name;
        }
        if let Some(x) = get_env_f64("TURTLE_SPAWN_X")? {
            spawn.x = x;
        }
        if let Some(y) = get_env_f64("TURTLE_SPAWN_Y")? {
            spawn.y = y;
        }
        if let Some(theta) = get_env_f64("TURTLE_SPAWN_THETA")? {
            spawn.theta = theta;
        }
        builder = builder.spawn(spawn);

        if let Some(service) = get_env_service("TURTLE_KILL_SERVICE")? {
            builder = builder.kill_service(service);
        }
        if let Some(service) = get_env_service("TURTLE_SPAWN_SERVICE")? {
            builder = builder.spawn_service(service);
        }
        if let Some(secs) = get_env_u64("TURTLE_SERVICE_POLL_SECS")? {
            builder = builder.service_poll_interval(Duration::from_secs(secs));
        }

        let mut policy = SteeringPolicy::default();
        if let Some(lower) = get_env_f64("TURTLE_STEER_LOWER_X")? {
            policy.lower_x = lower;
        }
        if let Some(upper) = get_env_f64("TURTLE_STEER_UPPER_X")? {
            policy.upper_x = upper;
        }
        if let Some(rate) = get_env_f64("TURTLE_STEER_TURN_RATE")? {
            policy.turn_rate = rate;
        }
        if let Some(speed) = get_env_f64("TURTLE_STEER_FORWARD_SPEED")? {
            policy.forward_speed = speed;
        }
        builder = builder.policy(policy);

        if let Some(abort) = get_env_bool("TURTLE_ABORT_ON_SETUP_FAILURE")? {
            builder = builder.abort_on_setup_failure(abort);
        }

        Ok(builder)
    }

    pub fn node_name(mut self, name: impl Into<String>) -> Self {
        self.config.node_name = name.into();
        self
    }

    pub fn remove_name(mut self, name: impl Into<String>) -> Self {
        self.config.remove_name = name.into();
        self
    }

    pub fn spawn(mut self, spawn: SpawnPose) -> Self {
        self.config.spawn = spawn;
        self
    }

    pub fn kill_service(mut self, service: ServiceName) -> Self {
        self.config.kill_service = service;
        self
    }

    pub fn spawn_service(mut self, service: ServiceName) -> Self {
        self.config.spawn_service = service;
        self
    }

    pub fn service_poll_interval(mut self, interval: Duration) -> Self {
        self.config.service_poll_interval = interval;
        self
    }

    pub fn policy(mut self, policy: SteeringPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn abort_on_setup_failure(mut self, abort: bool) -> Self {
        self.config.abort_on_setup_failure = abort;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for inconsistent values.
    pub fn build(self) -> Result<ControllerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid integer '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_f64(key: &str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid number '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_service(key: &str) -> Result<Option<ServiceName>, ConfigError> {
    match env::var(key) {
        Ok(val) => ServiceName::parse(&val)
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid service name '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
