//! Blocking-style service clients used during setup.
//!
//! A client first waits for its endpoint to be advertised, re-checking at a
//! fixed interval, then issues single-shot calls. Both waits race against
//! the node's shutdown token. A call that fails is logged and reported as
//! [`CallOutcome::Failed`]; only shutdown is returned as an error.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use steer_mesh::{MeshError, Message, ServiceName, ServiceType, Transport};
use tracing::{debug, error, info};

use crate::context::NodeContext;
use crate::error::{ControlError, ControlResult};
use crate::shutdown::ShutdownToken;

/// Resolution of one remote call
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// The server replied
    Completed(T),
    /// The call did not complete successfully
    Failed(MeshError),
}

impl<T> CallOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, CallOutcome::Completed(_))
    }

    pub fn response(&self) -> Option<&T> {
        match self {
            CallOutcome::Completed(response) => Some(response),
            CallOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&MeshError> {
        match self {
            CallOutcome::Completed(_) => None,
            CallOutcome::Failed(err) => Some(err),
        }
    }
}

/// Client for one service endpoint
pub struct ServiceClient<S: ServiceType> {
    transport: Arc<dyn Transport>,
    service: ServiceName,
    shutdown: ShutdownToken,
    poll_interval: Duration,
    _marker: PhantomData<fn() -> S>,
}

impl<S: ServiceType> ServiceClient<S> {
    pub fn new(ctx: &NodeContext, service: ServiceName, poll_interval: Duration) -> Self {
        Self {
            transport: ctx.transport(),
            service,
            shutdown: ctx.shutdown().clone(),
            poll_interval,
            _marker: PhantomData,
        }
    }

    /// Block until the endpoint is advertised
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownRequested` if shutdown is requested
    /// before the endpoint appears.
    pub async fn wait_for_service(&self) -> ControlResult<()> {
        loop {
            if self.transport.service_ready(&self.service).await {
                debug!(service = %self.service, "service available");
                return Ok(());
            }
            if self.shutdown.is_requested() {
                error!(service = %self.service, "client interrupted while waiting for service to appear");
                return Err(ControlError::ShutdownRequested);
            }
            info!(service = %self.service, "waiting for service to appear...");

            tokio::select! {
                biased;
                _ = self.shutdown.requested() => {
                    error!(service = %self.service, "client interrupted while waiting for service to appear");
                    return Err(ControlError::ShutdownRequested);
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Send one request and block until it resolves
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownRequested` if shutdown is requested
    /// while the call is in flight. Call failures are not errors; they are
    /// logged and returned as `CallOutcome::Failed`.
    pub async fn call(&self, request: S::Request) -> ControlResult<CallOutcome<S::Response>> {
        if self.shutdown.is_requested() {
            return Err(ControlError::ShutdownRequested);
        }

        let message = match Message::encode(&request) {
            Ok(message) => message,
            Err(e) => return Ok(self.failed(e)),
        };
        debug!(service = %self.service, kind = S::TYPE_NAME, ?request, "calling service");

        let result = tokio::select! {
            biased;
            _ = self.shutdown.requested() => {
                error!(service = %self.service, "client interrupted while waiting for response");
                return Err(ControlError::ShutdownRequested);
            }
            result = self.transport.call(&self.service, message) => result,
        };

        match result.and_then(|reply| reply.decode::<S::Response>()) {
            Ok(response) => {
                debug!(service = %self.service, ?response, "service call completed");
                Ok(CallOutcome::Completed(response))
            }
            Err(e) => Ok(self.failed(e)),
        }
    }

    fn failed(&self, err: MeshError) -> CallOutcome<S::Response> {
        error!(service = %self.service, error = %err, "service call failed :(");
        CallOutcome::Failed(err)
    }
}
