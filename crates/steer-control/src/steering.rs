//! Threshold steering law for corridor boundary avoidance.
//!
//! The law is bang-bang with a dead band: beyond the upper x threshold the
//! agent turns at `+turn_rate`, below the lower threshold at `-turn_rate`,
//! and in between it drives straight. Both thresholds are exclusive, so a
//! pose exactly on a threshold drives straight. Forward speed is constant.

use crate::interfaces::{Pose, Twist};

/// Parameters of the steering law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringPolicy {
    /// Turn negative when `x` is strictly below this
    pub lower_x: f64,
    /// Turn positive when `x` is strictly above this
    pub upper_x: f64,
    /// Magnitude of the yaw rate applied outside the dead band
    pub turn_rate: f64,
    /// Constant forward speed
    pub forward_speed: f64,
}

impl Default for SteeringPolicy {
    fn default() -> Self {
        Self {
            lower_x: 2.0,
            upper_x: 9.0,
            turn_rate: 4.0,
            forward_speed: 1.0,
        }
    }
}

impl SteeringPolicy {
    /// Compute the command for one pose sample
    pub fn steer(&self, pose: &Pose) -> Twist {
        let angular_z = if pose.x > self.upper_x {
            self.turn_rate
        } else if pose.x < self.lower_x {
            -self.turn_rate
        } else {
            0.0
        };
        Twist::planar(self.forward_speed, angular_z)
    }

    /// Check that the parameters describe a usable corridor
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("lower_x", self.lower_x),
            ("upper_x", self.upper_x),
            ("turn_rate", self.turn_rate),
            ("forward_speed", self.forward_speed),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("steering {name} must be finite, got {value}"));
        }
        if self.lower_x >= self.upper_x {
            return Err(format!(
                "steering lower_x ({}) must be below upper_x ({})",
                self.lower_x, self.upper_x
            ));
        }
        Ok(())
    }
}
