//! Explicit node context shared by all components of a control node.

use std::sync::Arc;
use std::time::Duration;
use steer_mesh::{
    MeshResult, MessageType, Publisher, ServiceName, ServiceType, Subscription, Topic, Transport,
};

use crate::client::ServiceClient;
use crate::shutdown::ShutdownToken;

/// Node name, transport and shutdown token, passed to every component
#[derive(Clone)]
pub struct NodeContext {
    node_name: String,
    transport: Arc<dyn Transport>,
    shutdown: ShutdownToken,
}

impl NodeContext {
    pub fn new(
        node_name: impl Into<String>,
        transport: Arc<dyn Transport>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            transport,
            shutdown,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn shutdown(&self) -> &ShutdownToken {
        &self.shutdown
    }

    pub fn create_client<S: ServiceType>(
        &self,
        service: ServiceName,
        poll_interval: Duration,
    ) -> ServiceClient<S> {
        ServiceClient::new(self, service, poll_interval)
    }

    pub fn create_publisher<T: MessageType>(&self, topic: Topic) -> Publisher<T> {
        Publisher::new(self.transport(), topic)
    }

    pub async fn create_subscription<T: MessageType>(
        &self,
        topic: Topic,
    ) -> MeshResult<Subscription<T>> {
        Subscription::subscribe(self.transport.as_ref(), topic).await
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("node_name", &self.node_name)
            .field("shutdown_requested", &self.shutdown.is_requested())
            .finish_non_exhaustive()
    }
}
