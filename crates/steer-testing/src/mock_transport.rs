//! # Mock Transport for Testing
//!
//! An in-process [`Transport`] with scripted services and inspectable
//! traffic. Clones share state, so a test keeps one handle while the code
//! under test owns another.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use steer_mesh::{
    MeshError, MeshResult, Message, MessageStream, ServiceName, Topic, Transport,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// How a mocked service answers calls
#[derive(Debug, Clone)]
pub enum ServiceBehavior {
    /// Reply with this payload
    Reply(serde_json::Value),
    /// Fail the call with this reason
    Fail(String),
    /// Never reply
    Hang,
}

/// One recorded interaction, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// `service_ready` was asked about a service
    ServiceQueried(String),
    /// A call was sent to a service
    CallStarted(String),
    /// A call to a service resolved (successfully or not)
    CallFinished(String),
    /// A subscription was opened on a topic
    Subscribed(String),
    /// A message was published on a topic
    Published(String),
}

#[derive(Debug)]
struct MockService {
    ready_after_polls: usize,
    polls: usize,
    behavior: ServiceBehavior,
    requests: Vec<Message>,
}

#[derive(Default)]
struct MockState {
    trace: Vec<TraceEvent>,
    services: HashMap<String, MockService>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<MeshResult<Message>>>>,
    published: Vec<(String, Message)>,
    fail_publishes: bool,
}

/// Scriptable in-process transport
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with no services and no traffic
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service that is advertised immediately
    pub fn with_service(self, name: &str, behavior: ServiceBehavior) -> Self {
        self.with_service_ready_after(name, 0, behavior)
    }

    /// Add a service that reports not-ready for the first `polls` queries
    pub fn with_service_ready_after(
        self,
        name: &str,
        polls: usize,
        behavior: ServiceBehavior,
    ) -> Self {
        self.lock().services.insert(
            name.to_string(),
            MockService {
                ready_after_polls: polls,
                polls: 0,
                behavior,
                requests: Vec::new(),
            },
        );
        self
    }

    /// Make every publish fail with `MeshError::SendFailed`
    pub fn with_failing_publishes(self) -> Self {
        self.lock().fail_publishes = true;
        self
    }

    /// Deliver a typed sample to every current subscriber of `topic`
    pub fn inject<T: Serialize>(&self, topic: &str, value: &T) {
        let payload = serde_json::to_value(value)
            .unwrap_or_else(|e| panic!("sample for {topic} must serialize: {e}"));
        self.inject_raw(topic, payload);
    }

    /// Deliver a raw JSON payload to every current subscriber of `topic`
    pub fn inject_raw(&self, topic: &str, payload: serde_json::Value) {
        let message = Message::new(payload);
        let mut state = self.lock();
        if let Some(senders) = state.subscribers.get_mut(topic) {
            senders.retain(|tx| tx.send(Ok(message.clone())).is_ok());
        }
    }

    /// End every subscription stream on `topic`
    pub fn close_topic(&self, topic: &str) {
        self.lock().subscribers.remove(topic);
    }

    /// Everything published on `topic`, oldest first
    pub fn published(&self, topic: &str) -> Vec<Message> {
        self.lock()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Everything published on `topic`, decoded
    pub fn published_as<T: DeserializeOwned>(&self, topic: &str) -> Vec<T> {
        self.published(topic)
            .iter()
            .map(|m| {
                m.decode()
                    .unwrap_or_else(|e| panic!("published message on {topic} must decode: {e}"))
            })
            .collect()
    }

    /// Requests received by `service`, oldest first
    pub fn requests(&self, service: &str) -> Vec<Message> {
        self.lock()
            .services
            .get(service)
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    /// Number of readiness queries for `service`
    pub fn poll_count(&self, service: &str) -> usize {
        self.lock()
            .trace
            .iter()
            .filter(|e| matches!(e, TraceEvent::ServiceQueried(s) if s == service))
            .count()
    }

    /// All recorded interactions, in order
    pub fn trace(&self) -> Vec<TraceEvent> {
        self.lock().trace.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(&self, topic: &Topic, message: Message) -> MeshResult<()> {
        let mut state = self.lock();
        state
            .trace
            .push(TraceEvent::Published(topic.as_str().to_string()));
        if state.fail_publishes {
            return Err(MeshError::SendFailed(format!("publish to {topic} refused")));
        }
        state.published.push((topic.as_str().to_string(), message));
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> MeshResult<MessageStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state
            .trace
            .push(TraceEvent::Subscribed(topic.as_str().to_string()));
        state
            .subscribers
            .entry(topic.as_str().to_string())
            .or_default()
            .push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn service_ready(&self, service: &ServiceName) -> bool {
        let mut state = self.lock();
        state
            .trace
            .push(TraceEvent::ServiceQueried(service.as_str().to_string()));
        match state.services.get_mut(service.as_str()) {
            Some(mock) => {
                mock.polls += 1;
                mock.polls > mock.ready_after_polls
            }
            None => false,
        }
    }

    async fn call(&self, service: &ServiceName, request: Message) -> MeshResult<Message> {
        let behavior = {
            let mut state = self.lock();
            state
                .trace
                .push(TraceEvent::CallStarted(service.as_str().to_string()));
            let found = state.services.get_mut(service.as_str()).map(|mock| {
                mock.requests.push(request.clone());
                mock.behavior.clone()
            });
            match found {
                Some(behavior) => behavior,
                None => {
                    state
                        .trace
                        .push(TraceEvent::CallFinished(service.as_str().to_string()));
                    return Err(MeshError::ServiceUnavailable(service.to_string()));
                }
            }
        };

        let result = match behavior {
            ServiceBehavior::Reply(payload) => Ok(request.reply(payload)),
            ServiceBehavior::Fail(reason) => Err(MeshError::CallFailed {
                service: service.to_string(),
                reason,
            }),
            ServiceBehavior::Hang => std::future::pending().await,
        };

        self.lock()
            .trace
            .push(TraceEvent::CallFinished(service.as_str().to_string()));
        result
    }
}
