//! # turtle-steer
//!
//! Facade over the workspace crates. [`mesh`] is the transport layer and
//! [`control`] is the node that replaces one simulated turtle with another
//! and steers it.

pub use steer_control as control;
pub use steer_mesh as mesh;

pub use steer_control::{
    ControlError, ControlStats, Controller, ControllerConfig, NodeContext, Pose, SteeringPolicy,
    Twist,
};
pub use steer_mesh::{MeshError, Transport};
