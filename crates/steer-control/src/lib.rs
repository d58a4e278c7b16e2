//! # Steer Control
//!
//! Control node for a two-agent simulated environment.
//!
//! On startup the [`Controller`] removes one agent and spawns another, each
//! through a blocking [`ServiceClient`] call, then steers the spawned agent:
//! every pose sample it reports is turned into exactly one velocity command
//! by the [`SteeringPolicy`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use steer_control::{Controller, ControllerConfig, NodeContext, shutdown};
//! use steer_mesh::Transport;
//!
//! async fn steer(transport: Arc<dyn Transport>) -> Result<(), Box<dyn std::error::Error>> {
//!     let (handle, token) = shutdown::channel();
//!     let _signals = shutdown::listen_for_signals(handle);
//!
//!     let ctx = NodeContext::new("my_controller", transport, token);
//!     let controller = Controller::connect(ctx, ControllerConfig::default()).await?;
//!     let stats = controller.run().await?;
//!     println!("handled {} samples", stats.samples_received);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod interfaces;
pub mod shutdown;
pub mod steering;

pub use client::{CallOutcome, ServiceClient};
pub use config::{ConfigError, ControllerConfig, ControllerConfigBuilder, SpawnPose};
pub use context::NodeContext;
pub use controller::{ControlStats, Controller, ControllerState, SetupReport};
pub use error::{ControlError, ControlResult, SetupStep};
pub use interfaces::{
    Kill, KillRequest, KillResponse, Pose, Spawn, SpawnRequest, SpawnResponse, Twist, Vector3,
};
pub use shutdown::{ShutdownHandle, ShutdownToken};
pub use steering::SteeringPolicy;
