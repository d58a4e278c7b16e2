//! End-to-end controller scenarios against the in-process mock transport

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use steer_control::{
    ControllerConfig, Controller, NodeContext, Pose, ShutdownHandle, Twist, shutdown,
};
use steer_testing::{MockTransport, ServiceBehavior, TraceEvent};

const POSE: &str = "/turtle2/pose";
const CMD: &str = "/turtle2/cmd_vel";

fn simulator() -> MockTransport {
    MockTransport::new()
        .with_service("kill", ServiceBehavior::Reply(json!({})))
        .with_service("spawn", ServiceBehavior::Reply(json!({"name": "turtle2"})))
}

async fn connect(transport: &MockTransport) -> (ShutdownHandle, Controller) {
    let (handle, token) = shutdown::channel();
    let ctx = NodeContext::new("my_controller", Arc::new(transport.clone()), token);
    let controller = Controller::connect(ctx, ControllerConfig::default())
        .await
        .expect("services are advertised");
    (handle, controller)
}

#[tokio::test]
async fn test_boundary_scenarios_produce_expected_commands() {
    let transport = simulator();
    let (_handle, controller) = connect(&transport).await;

    // Right of the corridor, left of it, inside it, then exactly on each bound
    for x in [9.5, 1.0, 5.0, 9.0, 2.0] {
        transport.inject(POSE, &Pose::new(x, 5.5, 0.0));
    }
    transport.close_topic(POSE);

    let stats = controller.run().await.expect("setup succeeds");

    assert_eq!(stats.samples_received, 5);
    assert_eq!(stats.commands_published, 5);
    assert_eq!(
        transport.published_as::<Twist>(CMD),
        vec![
            Twist::planar(1.0, 4.0),
            Twist::planar(1.0, -4.0),
            Twist::planar(1.0, 0.0),
            Twist::planar(1.0, 0.0),
            Twist::planar(1.0, 0.0),
        ]
    );
}

#[tokio::test]
async fn test_no_command_before_setup_completes() {
    let transport = simulator();
    let (_handle, controller) = connect(&transport).await;

    // Samples delivered while setup is pending are buffered, not acted on
    transport.inject(POSE, &Pose::new(10.0, 1.0, 0.0));
    transport.close_topic(POSE);

    controller.run().await.expect("setup succeeds");

    let trace = transport.trace();
    let spawn_done = trace
        .iter()
        .position(|e| *e == TraceEvent::CallFinished("spawn".to_string()))
        .expect("spawn resolved");
    let first_publish = trace
        .iter()
        .position(|e| matches!(e, TraceEvent::Published(_)))
        .expect("one command published");
    let kill_started = trace
        .iter()
        .position(|e| *e == TraceEvent::CallStarted("kill".to_string()))
        .expect("removal issued");
    let kill_done = trace
        .iter()
        .position(|e| *e == TraceEvent::CallFinished("kill".to_string()))
        .expect("removal resolved");
    let spawn_started = trace
        .iter()
        .position(|e| *e == TraceEvent::CallStarted("spawn".to_string()))
        .expect("spawn issued");

    assert!(kill_started < kill_done);
    assert!(kill_done < spawn_started);
    assert!(spawn_done < first_publish);
}

#[tokio::test]
async fn test_malformed_samples_are_skipped() {
    let transport = simulator();
    let (_handle, controller) = connect(&transport).await;

    transport.inject_raw(POSE, json!({"x": "far away"}));
    transport.inject(POSE, &Pose::new(1.5, 1.0, 0.0));
    transport.close_topic(POSE);

    let stats = controller.run().await.expect("setup succeeds");

    assert_eq!(stats.malformed_samples, 1);
    assert_eq!(stats.samples_received, 1);
    assert_eq!(
        transport.published_as::<Twist>(CMD),
        vec![Twist::planar(1.0, -4.0)]
    );
}

#[tokio::test]
async fn test_setup_failures_do_not_stop_steering() {
    let transport = MockTransport::new()
        .with_service("kill", ServiceBehavior::Fail("no turtle named turtle1".into()))
        .with_service("spawn", ServiceBehavior::Fail("turtle2 already exists".into()));
    let (_handle, controller) = connect(&transport).await;

    transport.inject(POSE, &Pose::new(9.5, 1.0, 0.0));
    transport.close_topic(POSE);

    let stats = controller.run().await.expect("failures are only logged");
    assert_eq!(stats.commands_published, 1);
}

#[tokio::test]
async fn test_shutdown_stops_running_controller() {
    let transport = simulator();
    let (handle, controller) = connect(&transport).await;

    let task = tokio::spawn(controller.run());
    transport.inject(POSE, &Pose::new(5.0, 1.0, 0.0));

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.request();

    let stats = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("controller stops promptly")
        .expect("task does not panic")
        .expect("setup succeeds");
    assert_eq!(stats.samples_received, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_waiting_for_services() {
    let transport = MockTransport::new();
    let (handle, token) = shutdown::channel();
    let ctx = NodeContext::new("my_controller", Arc::new(transport.clone()), token);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.request();
    });

    let err = Controller::connect(ctx, ControllerConfig::default())
        .await
        .unwrap_err();

    assert!(err.is_shutdown());
    assert_eq!(transport.poll_count("spawn"), 0);
    assert!(transport.requests("kill").is_empty());
}
