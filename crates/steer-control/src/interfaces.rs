//! Message and service shapes exchanged with the simulator.

use serde::{Deserialize, Serialize};
use steer_mesh::{MessageType, ServiceType};

/// A 3-vector of reals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

/// Velocity command: linear and angular velocity applied for the next step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    /// Planar command: forward speed along x, yaw rate about z, all else zero
    pub fn planar(linear_x: f64, angular_z: f64) -> Self {
        Self {
            linear: Vector3 {
                x: linear_x,
                ..Vector3::ZERO
            },
            angular: Vector3 {
                z: angular_z,
                ..Vector3::ZERO
            },
        }
    }
}

impl MessageType for Twist {
    const TYPE_NAME: &'static str = "geometry_msgs/Twist";
}

/// Reported pose of an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    #[serde(default)]
    pub linear_velocity: f64,
    #[serde(default)]
    pub angular_velocity: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta,
            ..Self::default()
        }
    }
}

impl MessageType for Pose {
    const TYPE_NAME: &'static str = "turtlesim/Pose";
}

/// Removal service
pub struct Kill;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillRequest {
    pub name: String,
}

/// Empty success marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillResponse {}

impl ServiceType for Kill {
    const TYPE_NAME: &'static str = "turtlesim/Kill";
    type Request = KillRequest;
    type Response = KillResponse;
}

/// Creation service
pub struct Spawn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub name: String,
}

/// Name the environment gave the new agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnResponse {
    pub name: String,
}

impl ServiceType for Spawn {
    const TYPE_NAME: &'static str = "turtlesim/Spawn";
    type Request = SpawnRequest;
    type Response = SpawnResponse;
}
