//! # Steer Mesh
//!
//! Transport layer for the turtle-steer control node.
//!
//! The crate abstracts the pub/sub and remote-call primitives a control node
//! consumes. Backends implement [`Transport`]; nodes talk to it through the
//! typed [`Publisher`] and [`Subscription`] wrappers and through
//! [`ServiceType`] request/response pairs.
//!
//! ## Features
//!
//! - **Validated names**: [`Topic`] and [`ServiceName`] reject malformed graph names
//! - **Typed payloads**: JSON [`Message`] envelopes with encode/decode helpers
//! - **Remote calls**: correlated request/reply with no client-side timeout
//! - **Redis backend**: enable the `redis` feature for [`RedisTransport`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use steer_mesh::{Topic, Transport};
//!
//! # #[cfg(feature = "redis")]
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = steer_mesh::RedisTransport::new("redis://localhost:6379").await?;
//!     let mut poses = transport.subscribe(&Topic::parse("/turtle2/pose")?).await?;
//!     Ok(())
//! }
//! # #[cfg(not(feature = "redis"))]
//! # fn main() {}
//! ```

pub mod error;
pub mod mesh;
pub mod message;
pub mod typed;
pub mod types;

#[cfg(feature = "redis")]
pub mod redis;

pub use error::{MeshError, MeshResult};
pub use mesh::{MessageStream, Transport};
pub use message::{ERROR_KEY, Message, MessageId, MessageMetadata, REPLY_TO_KEY};
pub use typed::{MessageType, Publisher, ServiceType, Subscription, TYPE_KEY};
pub use types::{NameValidationError, ServiceName, Topic};

#[cfg(feature = "redis")]
pub use redis::{RedisConfig, RedisTransport};
