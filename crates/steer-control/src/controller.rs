//! Controller: ordered setup followed by the pose-driven steering loop.
//!
//! ```text
//! Initializing --(remove, then spawn)--> Running --(shutdown / stream end)--> Terminal
//! ```
//!
//! Setup is strictly sequential: the removal call resolves before the spawn
//! call is issued, and both resolve before the first pose sample is handled.
//! Samples that arrive during setup are buffered by the subscription and
//! handled once the loop starts. Each sample is handled to completion
//! (log, steer, publish) before the next one is read.

use steer_mesh::{Publisher, Subscription, Topic};
use tracing::{debug, error, info, warn};

use crate::client::{CallOutcome, ServiceClient};
use crate::config::ControllerConfig;
use crate::context::NodeContext;
use crate::error::{ControlError, ControlResult, SetupStep};
use crate::interfaces::{
    Kill, KillRequest, KillResponse, Pose, Spawn, SpawnRequest, SpawnResponse, Twist,
};

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Initializing,
    Running,
    Terminal,
}

/// Outcomes of the two setup calls, kept for inspection
#[derive(Debug)]
pub struct SetupReport {
    pub removal: CallOutcome<KillResponse>,
    pub spawn: CallOutcome<SpawnResponse>,
}

/// Counters for one run of the steering loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlStats {
    pub samples_received: u64,
    pub commands_published: u64,
    pub publish_failures: u64,
    pub malformed_samples: u64,
}

enum LoopEvent {
    Shutdown,
    Sample(Option<steer_mesh::MeshResult<Pose>>),
}

/// Steers one spawned agent from its pose stream
pub struct Controller {
    ctx: NodeContext,
    config: ControllerConfig,
    kill_client: ServiceClient<Kill>,
    spawn_client: ServiceClient<Spawn>,
    cmd_publisher: Publisher<Twist>,
    pose_subscription: Subscription<Pose>,
    state: ControllerState,
    stats: ControlStats,
}

impl Controller {
    /// Create the publisher, subscription and clients, then wait for both
    /// service endpoints (removal first, then spawn)
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownRequested` if shutdown interrupts an
    /// endpoint wait, and mesh errors if the topics cannot be set up.
    pub async fn connect(ctx: NodeContext, config: ControllerConfig) -> ControlResult<Self> {
        let agent = config.spawn.name.as_str();
        let cmd_topic = Topic::scoped(agent, "cmd_vel")
            .map_err(|e| steer_mesh::MeshError::invalid_name(agent, e))?;
        let pose_topic = Topic::scoped(agent, "pose")
            .map_err(|e| steer_mesh::MeshError::invalid_name(agent, e))?;

        let cmd_publisher = ctx.create_publisher::<Twist>(cmd_topic);
        let pose_subscription = ctx.create_subscription::<Pose>(pose_topic).await?;

        let kill_client: ServiceClient<Kill> =
            ctx.create_client(config.kill_service.clone(), config.service_poll_interval);
        kill_client.wait_for_service().await?;

        let spawn_client: ServiceClient<Spawn> =
            ctx.create_client(config.spawn_service.clone(), config.service_poll_interval);
        spawn_client.wait_for_service().await?;

        info!(
            node = ctx.node_name(),
            cmd_topic = %cmd_publisher.topic(),
            pose_topic = %pose_subscription.topic(),
            "controller connected"
        );

        Ok(Self {
            ctx,
            config,
            kill_client,
            spawn_client,
            cmd_publisher,
            pose_subscription,
            state: ControllerState::Initializing,
            stats: ControlStats::default(),
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn stats(&self) -> ControlStats {
        self.stats
    }

    /// Remove the named agent; blocks until the call resolves
    pub async fn remove(&mut self, name: &str) -> ControlResult<CallOutcome<KillResponse>> {
        info!(agent = name, "removing agent");
        self.kill_client
            .call(KillRequest {
                name: name.to_string(),
            })
            .await
    }

    /// Spawn a named agent at a pose; blocks until the call resolves
    pub async fn spawn(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        theta: f64,
    ) -> ControlResult<CallOutcome<SpawnResponse>> {
        info!(agent = name, x, y, theta, "spawning agent");
        let outcome = self
            .spawn_client
            .call(SpawnRequest {
                x,
                y,
                theta,
                name: name.to_string(),
            })
            .await?;

        if let Some(response) = outcome.response()
            && response.name != name
        {
            warn!(
                requested = name,
                spawned = %response.name,
                "environment renamed the spawned agent; staying on the requested topics"
            );
        }
        Ok(outcome)
    }

    /// Run the Initializing phase: removal, then spawn
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownRequested` if shutdown interrupts a
    /// call. With `abort_on_setup_failure` a failed call returns
    /// `ControlError::Setup` and leaves the controller Terminal; otherwise
    /// failures are only logged.
    pub async fn initialize(&mut self) -> ControlResult<SetupReport> {
        self.state = ControllerState::Initializing;

        let remove_name = self.config.remove_name.clone();
        let removed = self.remove(&remove_name).await;
        let removal = self.abort_if_failed(SetupStep::Remove, removed)?;

        let target = self.config.spawn.clone();
        let spawned = self
            .spawn(&target.name, target.x, target.y, target.theta)
            .await;
        let spawn = self.abort_if_failed(SetupStep::Spawn, spawned)?;

        self.state = ControllerState::Running;
        info!(
            removed = removal.is_completed(),
            spawned = spawn.is_completed(),
            "setup finished, steering"
        );
        Ok(SetupReport { removal, spawn })
    }

    fn abort_if_failed<T>(
        &mut self,
        step: SetupStep,
        outcome: ControlResult<CallOutcome<T>>,
    ) -> ControlResult<CallOutcome<T>> {
        match outcome {
            Ok(CallOutcome::Failed(source)) if self.config.abort_on_setup_failure => {
                error!(%step, "setup step failed, aborting");
                self.state = ControllerState::Terminal;
                Err(ControlError::Setup { step, source })
            }
            Err(e) => {
                self.state = ControllerState::Terminal;
                Err(e)
            }
            Ok(outcome) => Ok(outcome),
        }
    }

    /// Handle one pose sample: log it, steer, publish exactly one command
    pub async fn handle_pose(&mut self, pose: &Pose) -> Twist {
        info!(
            x = pose.x,
            y = pose.y,
            theta = pose.theta,
            "Turtlebot pose is: x: {} y: {} theta: {}",
            pose.x,
            pose.y,
            pose.theta
        );

        self.stats.samples_received += 1;
        let cmd = self.config.policy.steer(pose);
        match self.cmd_publisher.publish(&cmd).await {
            Ok(()) => {
                self.stats.commands_published += 1;
                debug!(linear_x = cmd.linear.x, angular_z = cmd.angular.z, "command published");
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                error!(topic = %self.cmd_publisher.topic(), error = %e, "failed to publish command");
            }
        }
        cmd
    }

    /// Run the Running phase until shutdown or until the pose stream ends
    pub async fn spin(&mut self) {
        let shutdown = self.ctx.shutdown().clone();

        while self.state == ControllerState::Running {
            let event = tokio::select! {
                biased;
                _ = shutdown.requested() => LoopEvent::Shutdown,
                sample = self.pose_subscription.next() => LoopEvent::Sample(sample),
            };

            match event {
                LoopEvent::Shutdown => {
                    info!("shutdown requested, stopping control loop");
                    self.state = ControllerState::Terminal;
                }
                LoopEvent::Sample(None) => {
                    info!(topic = %self.pose_subscription.topic(), "pose stream closed");
                    self.state = ControllerState::Terminal;
                }
                LoopEvent::Sample(Some(Err(e))) => {
                    self.stats.malformed_samples += 1;
                    warn!(error = %e, "skipping malformed pose sample");
                }
                LoopEvent::Sample(Some(Ok(pose))) => {
                    self.handle_pose(&pose).await;
                }
            }
        }

        info!(
            samples = self.stats.samples_received,
            published = self.stats.commands_published,
            publish_failures = self.stats.publish_failures,
            malformed = self.stats.malformed_samples,
            "control loop finished"
        );
    }

    /// Initialize, then steer until Terminal
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Controller::initialize`].
    pub async fn run(mut self) -> ControlResult<ControlStats> {
        self.initialize().await?;
        self.spin().await;
        Ok(self.stats)
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("node", &self.ctx.node_name())
            .field("agent", &self.config.spawn.name)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfigBuilder;
    use crate::shutdown;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use steer_testing::{MockTransport, ServiceBehavior, TraceEvent};

    const POSE: &str = "/turtle2/pose";
    const CMD: &str = "/turtle2/cmd_vel";

    fn ready_transport() -> MockTransport {
        MockTransport::new()
            .with_service("kill", ServiceBehavior::Reply(json!({})))
            .with_service("spawn", ServiceBehavior::Reply(json!({"name": "turtle2"})))
    }

    async fn connect(
        transport: &MockTransport,
        config: ControllerConfig,
    ) -> (shutdown::ShutdownHandle, Controller) {
        let (handle, token) = shutdown::channel();
        let ctx = NodeContext::new("my_controller", Arc::new(transport.clone()), token);
        let controller = Controller::connect(ctx, config).await.unwrap();
        (handle, controller)
    }

    #[tokio::test]
    async fn test_connect_waits_for_kill_then_spawn() {
        let transport = ready_transport();
        let (_handle, controller) = connect(&transport, ControllerConfig::default()).await;

        assert_eq!(controller.state(), ControllerState::Initializing);
        assert_eq!(
            transport.trace(),
            vec![
                TraceEvent::Subscribed(POSE.to_string()),
                TraceEvent::ServiceQueried("kill".to_string()),
                TraceEvent::ServiceQueried("spawn".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_initialize_removes_before_spawning() {
        let transport = ready_transport();
        let (_handle, mut controller) = connect(&transport, ControllerConfig::default()).await;

        let report = controller.initialize().await.unwrap();

        assert!(report.removal.is_completed());
        assert_eq!(report.spawn.response().unwrap().name, "turtle2");
        assert_eq!(controller.state(), ControllerState::Running);

        let calls: Vec<_> = transport
            .trace()
            .into_iter()
            .filter(|e| matches!(e, TraceEvent::CallStarted(_) | TraceEvent::CallFinished(_)))
            .collect();
        assert_eq!(
            calls,
            vec![
                TraceEvent::CallStarted("kill".to_string()),
                TraceEvent::CallFinished("kill".to_string()),
                TraceEvent::CallStarted("spawn".to_string()),
                TraceEvent::CallFinished("spawn".to_string()),
            ]
        );
        assert_eq!(transport.requests("kill")[0].payload, json!({"name": "turtle1"}));
    }

    #[tokio::test]
    async fn test_removal_failure_is_logged_and_setup_continues() {
        let transport = MockTransport::new()
            .with_service("kill", ServiceBehavior::Fail("no turtle".to_string()))
            .with_service("spawn", ServiceBehavior::Reply(json!({"name": "turtle2"})));
        let (_handle, mut controller) = connect(&transport, ControllerConfig::default()).await;

        let report = controller.initialize().await.unwrap();

        assert!(!report.removal.is_completed());
        assert!(report.spawn.is_completed());
        assert_eq!(controller.state(), ControllerState::Running);
    }

    #[tokio::test]
    async fn test_abort_on_setup_failure_skips_spawn() {
        let transport = MockTransport::new()
            .with_service("kill", ServiceBehavior::Fail("no turtle".to_string()))
            .with_service("spawn", ServiceBehavior::Reply(json!({"name": "turtle2"})));
        let config = ControllerConfigBuilder::new()
            .abort_on_setup_failure(true)
            .build()
            .unwrap();
        let (_handle, mut controller) = connect(&transport, config).await;

        let err = controller.initialize().await.unwrap_err();

        assert!(matches!(
            err,
            ControlError::Setup {
                step: SetupStep::Remove,
                ..
            }
        ));
        assert_eq!(controller.state(), ControllerState::Terminal);
        assert!(transport.requests("spawn").is_empty());
    }

    #[tokio::test]
    async fn test_renamed_spawn_still_completes() {
        let transport = MockTransport::new()
            .with_service("kill", ServiceBehavior::Reply(json!({})))
            .with_service("spawn", ServiceBehavior::Reply(json!({"name": "turtle3"})));
        let (_handle, mut controller) = connect(&transport, ControllerConfig::default()).await;

        let report = controller.initialize().await.unwrap();
        assert_eq!(report.spawn.response().unwrap().name, "turtle3");
    }

    #[tokio::test]
    async fn test_handle_pose_publishes_one_command() {
        let transport = ready_transport();
        let (_handle, mut controller) = connect(&transport, ControllerConfig::default()).await;

        let cmd = controller.handle_pose(&Pose::new(9.5, 0.0, 0.0)).await;

        assert_eq!(cmd, Twist::planar(1.0, 4.0));
        assert_eq!(transport.published_as::<Twist>(CMD), vec![cmd]);
        assert_eq!(controller.stats().samples_received, 1);
        assert_eq!(controller.stats().commands_published, 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_counted_and_loop_continues() {
        let transport = ready_transport().with_failing_publishes();
        let (_handle, controller) = connect(&transport, ControllerConfig::default()).await;

        transport.inject(POSE, &Pose::new(1.0, 0.0, 0.0));
        transport.inject(POSE, &Pose::new(5.0, 0.0, 0.0));
        transport.close_topic(POSE);

        let stats = controller_run(controller).await;
        assert_eq!(stats.samples_received, 2);
        assert_eq!(stats.publish_failures, 2);
        assert_eq!(stats.commands_published, 0);
    }

    #[tokio::test]
    async fn test_debug_shows_agent_and_state() {
        let transport = ready_transport();
        let (_handle, controller) = connect(&transport, ControllerConfig::default()).await;

        let rendered = format!("{controller:?}");
        assert!(rendered.contains("agent: \"turtle2\""));
        assert!(rendered.contains("state: Initializing"));
    }

    async fn controller_run(controller: Controller) -> ControlStats {
        tokio::time::timeout(Duration::from_secs(5), controller.run())
            .await
            .expect("run should finish once the pose stream closes")
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_steers_buffered_samples_in_order() {
        let transport = ready_transport();
        let (_handle, controller) = connect(&transport, ControllerConfig::default()).await;

        transport.inject(POSE, &Pose::new(9.5, 0.0, 0.0));
        transport.inject(POSE, &Pose::new(1.0, 0.0, 0.0));
        transport.inject(POSE, &Pose::new(5.0, 0.0, 0.0));
        transport.close_topic(POSE);

        let stats = controller_run(controller).await;

        assert_eq!(stats.samples_received, 3);
        assert_eq!(
            transport.published_as::<Twist>(CMD),
            vec![
                Twist::planar(1.0, 4.0),
                Twist::planar(1.0, -4.0),
                Twist::planar(1.0, 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_sample_is_skipped() {
        let transport = ready_transport();
        let (_handle, controller) = connect(&transport, ControllerConfig::default()).await;

        transport.inject_raw(POSE, json!({"not": "a pose"}));
        transport.inject(POSE, &Pose::new(5.0, 0.0, 0.0));
        transport.close_topic(POSE);

        let stats = controller_run(controller).await;
        assert_eq!(stats.malformed_samples, 1);
        assert_eq!(stats.samples_received, 1);
        assert_eq!(transport.published(CMD).len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_running_loop() {
        let transport = ready_transport();
        let (handle, controller) = connect(&transport, ControllerConfig::default()).await;

        let run = tokio::spawn(controller.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.request();

        let stats = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run should stop after shutdown")
            .unwrap()
            .unwrap();
        assert_eq!(stats, ControlStats::default());
    }

    #[tokio::test]
    async fn test_shutdown_during_spawn_call_aborts_setup() {
        let transport = MockTransport::new()
            .with_service("kill", ServiceBehavior::Reply(json!({})))
            .with_service("spawn", ServiceBehavior::Hang);
        let (handle, mut controller) = connect(&transport, ControllerConfig::default()).await;

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.request();
        });

        let err = controller.initialize().await.unwrap_err();
        assert!(err.is_shutdown());
        assert_eq!(controller.state(), ControllerState::Terminal);
        assert!(transport.published(CMD).is_empty());
    }
}
