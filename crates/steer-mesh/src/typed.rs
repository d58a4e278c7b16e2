//! Typed publishers and subscriptions over a [`Transport`].
//!
//! A [`MessageType`] names a payload shape that travels on a topic, and a
//! [`ServiceType`] pairs a request shape with its response shape. The
//! wrappers here encode and decode through the JSON [`Message`] envelope so
//! callers never touch raw payloads.

use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    error::MeshResult,
    mesh::{MessageStream, Transport},
    message::Message,
    types::Topic,
};

/// Metadata key recording the payload type of a message
pub const TYPE_KEY: &str = "type";

/// A payload that is published on topics
pub trait MessageType: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fully-qualified type name, e.g. `geometry_msgs/Twist`
    const TYPE_NAME: &'static str;
}

/// A request/response pair served by a remote endpoint
pub trait ServiceType: Send + Sync + 'static {
    /// Fully-qualified service type name, e.g. `turtlesim/Kill`
    const TYPE_NAME: &'static str;
    type Request: Serialize + DeserializeOwned + Send + Sync + std::fmt::Debug;
    type Response: Serialize + DeserializeOwned + Send + Sync + std::fmt::Debug;
}

/// Publishes typed values on a single topic
pub struct Publisher<T> {
    transport: Arc<dyn Transport>,
    topic: Topic,
    _marker: PhantomData<fn(T)>,
}

impl<T: MessageType> Publisher<T> {
    /// Create a publisher bound to `topic`
    pub fn new(transport: Arc<dyn Transport>, topic: Topic) -> Self {
        Self {
            transport,
            topic,
            _marker: PhantomData,
        }
    }

    /// Topic this publisher writes to
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Encode and publish one value
    pub async fn publish(&self, value: &T) -> MeshResult<()> {
        let message = Message::encode(value)?.with_metadata(TYPE_KEY, T::TYPE_NAME);
        self.transport.publish(&self.topic, message).await
    }
}

/// Receives typed values from a single topic, in arrival order
pub struct Subscription<T> {
    topic: Topic,
    stream: MessageStream,
    _marker: PhantomData<fn() -> T>,
}

impl<T: MessageType> Subscription<T> {
    /// Subscribe to `topic` on the given transport
    pub async fn subscribe(transport: &dyn Transport, topic: Topic) -> MeshResult<Self> {
        let stream = transport.subscribe(&topic).await?;
        Ok(Self {
            topic,
            stream,
            _marker: PhantomData,
        })
    }

    /// Topic this subscription reads from
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Wait for the next sample
    ///
    /// Returns `None` once the transport closes the stream. A sample that
    /// fails to decode is returned as an error without ending the stream.
    pub async fn next(&mut self) -> Option<MeshResult<T>> {
        let item = self.stream.next().await?;
        Some(item.and_then(|message| message.decode::<T>()))
    }
}
