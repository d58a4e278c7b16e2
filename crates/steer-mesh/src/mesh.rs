//! Core Transport trait for topic and service communication

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{
    error::MeshResult,
    message::Message,
    types::{ServiceName, Topic},
};

/// Stream type for receiving messages
pub type MessageStream = Pin<Box<dyn Stream<Item = MeshResult<Message>> + Send + 'static>>;

/// Publish/subscribe and remote-call primitives consumed by a control node
///
/// Implementations own the wire protocol; callers only see [`Message`]
/// envelopes.
///
/// # Example
///
/// ```rust,no_run
/// use steer_mesh::{Message, ServiceName, Topic, Transport};
///
/// async fn example(transport: impl Transport) -> Result<(), Box<dyn std::error::Error>> {
///     let topic = Topic::parse("/turtle2/cmd_vel")?;
///     transport.publish(&topic, Message::new(serde_json::json!({}))).await?;
///
///     let kill = ServiceName::parse("kill")?;
///     if transport.service_ready(&kill).await {
///         let request = Message::new(serde_json::json!({"name": "turtle1"}));
///         let _reply = transport.call(&kill, request).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a message to a topic
    ///
    /// # Errors
    ///
    /// Returns `MeshError` if publishing fails
    async fn publish(&self, topic: &Topic, message: Message) -> MeshResult<()>;

    /// Subscribe to messages on a topic
    ///
    /// The stream receives messages published after subscription, in
    /// arrival order. Messages are buffered until the stream is polled.
    ///
    /// # Errors
    ///
    /// Returns `MeshError` if the subscription cannot be established
    async fn subscribe(&self, topic: &Topic) -> MeshResult<MessageStream>;

    /// Check whether a server is currently advertising the service
    async fn service_ready(&self, service: &ServiceName) -> bool;

    /// Send a request to a service and wait for its reply
    ///
    /// There is no timeout: the future resolves when the reply arrives or
    /// the transport reports a failure. Callers cancel by dropping it.
    ///
    /// # Errors
    ///
    /// Returns `MeshError::CallFailed` when the server reports an error and
    /// backend errors when the request cannot be delivered
    async fn call(&self, service: &ServiceName, request: Message) -> MeshResult<Message>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn publish(&self, topic: &Topic, message: Message) -> MeshResult<()> {
        (**self).publish(topic, message).await
    }

    async fn subscribe(&self, topic: &Topic) -> MeshResult<MessageStream> {
        (**self).subscribe(topic).await
    }

    async fn service_ready(&self, service: &ServiceName) -> bool {
        (**self).service_ready(service).await
    }

    async fn call(&self, service: &ServiceName, request: Message) -> MeshResult<Message> {
        (**self).call(service, request).await
    }
}
