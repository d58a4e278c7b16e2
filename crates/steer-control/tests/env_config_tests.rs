//! Integration tests for environment-based configuration

use serial_test::serial;
use std::env;
use std::time::Duration;
use steer_control::{ConfigError, ControllerConfigBuilder, SteeringPolicy};

const ALL_VARS: &[&str] = &[
    "TURTLE_NODE_NAME",
    "TURTLE_REMOVE_NAME",
    "TURTLE_SPAWN_NAME",
    "TURTLE_SPAWN_X",
    "TURTLE_SPAWN_Y",
    "TURTLE_SPAWN_THETA",
    "TURTLE_KILL_SERVICE",
    "TURTLE_SPAWN_SERVICE",
    "TURTLE_SERVICE_POLL_SECS",
    "TURTLE_STEER_LOWER_X",
    "TURTLE_STEER_UPPER_X",
    "TURTLE_STEER_TURN_RATE",
    "TURTLE_STEER_FORWARD_SPEED",
    "TURTLE_ABORT_ON_SETUP_FAILURE",
];

/// Helper to set environment variable for test
fn set_env(key: &str, value: &str) {
    unsafe {
        env::set_var(key, value);
    }
}

fn clear_all_turtle_env_vars() {
    for key in ALL_VARS {
        unsafe {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_env_config_default_when_no_vars_set() {
    clear_all_turtle_env_vars();

    let config = ControllerConfigBuilder::from_env()
        .expect("should load defaults when no env vars set")
        .build()
        .expect("should build valid config");

    assert_eq!(config.remove_name, "turtle1");
    assert_eq!(config.spawn.name, "turtle2");
    assert_eq!(config.spawn.x, 2.0);
    assert_eq!(config.spawn.y, 1.0);
    assert_eq!(config.spawn.theta, 0.0);
    assert_eq!(config.service_poll_interval, Duration::from_secs(1));
    assert_eq!(config.policy, SteeringPolicy::default());
    assert!(!config.abort_on_setup_failure);
}

#[test]
#[serial]
fn test_env_config_overrides() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_REMOVE_NAME", "leonardo");
    set_env("TURTLE_SPAWN_NAME", "raphael");
    set_env("TURTLE_SPAWN_X", "5.5");
    set_env("TURTLE_SPAWN_THETA", "1.57");
    set_env("TURTLE_SPAWN_SERVICE", "/sim/spawn");
    set_env("TURTLE_SERVICE_POLL_SECS", "3");
    set_env("TURTLE_STEER_UPPER_X", "10.0");
    set_env("TURTLE_ABORT_ON_SETUP_FAILURE", "yes");

    let config = ControllerConfigBuilder::from_env()
        .expect("should load config")
        .build()
        .expect("should build valid config");

    assert_eq!(config.remove_name, "leonardo");
    assert_eq!(config.spawn.name, "raphael");
    assert_eq!(config.spawn.x, 5.5);
    assert_eq!(config.spawn.y, 1.0);
    assert_eq!(config.spawn.theta, 1.57);
    assert_eq!(config.spawn_service.as_str(), "/sim/spawn");
    assert_eq!(config.kill_service.as_str(), "kill");
    assert_eq!(config.service_poll_interval, Duration::from_secs(3));
    assert_eq!(config.policy.upper_x, 10.0);
    assert_eq!(config.policy.lower_x, 2.0);
    assert!(config.abort_on_setup_failure);

    clear_all_turtle_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_number() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_SPAWN_X", "two");

    let result = ControllerConfigBuilder::from_env();
    match result {
        Err(ConfigError::InvalidEnvVar { key, .. }) => assert_eq!(key, "TURTLE_SPAWN_X"),
        other => panic!("expected InvalidEnvVar, got {other:?}"),
    }

    clear_all_turtle_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_bool() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_ABORT_ON_SETUP_FAILURE", "maybe");

    let err = ControllerConfigBuilder::from_env().unwrap_err();
    assert!(err.to_string().contains("invalid boolean value 'maybe'"));

    clear_all_turtle_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_service_name() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_KILL_SERVICE", "kill turtle");

    let err = ControllerConfigBuilder::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));

    clear_all_turtle_env_vars();
}

#[test]
#[serial]
fn test_env_config_validation_runs_on_build() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_STEER_LOWER_X", "9.5");

    let err = ControllerConfigBuilder::from_env()
        .expect("values parse")
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    clear_all_turtle_env_vars();
}

#[test]
#[serial]
fn test_env_config_zero_poll_interval_rejected() {
    clear_all_turtle_env_vars();
    set_env("TURTLE_SERVICE_POLL_SECS", "0");

    let err = ControllerConfigBuilder::from_env()
        .expect("values parse")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("poll interval"));

    clear_all_turtle_env_vars();
}
