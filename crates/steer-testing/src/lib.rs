//! # Steer Testing
//!
//! Test doubles for code written against [`steer_mesh::Transport`].
//!
//! [`MockTransport`] answers service calls from scripted behaviors, records
//! every interaction in order, and lets a test push samples into a
//! subscribed topic or close it.
//!
//! ```rust
//! use serde_json::json;
//! use steer_testing::{MockTransport, ServiceBehavior};
//!
//! let transport = MockTransport::new()
//!     .with_service("kill", ServiceBehavior::Reply(json!({})))
//!     .with_service_ready_after("spawn", 2, ServiceBehavior::Fail("busy".into()));
//! assert!(transport.trace().is_empty());
//! ```

pub mod mock_transport;

pub use mock_transport::{MockTransport, ServiceBehavior, TraceEvent};
