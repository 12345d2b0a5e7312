//! Integration tests for the connection lifecycle.
//!
//! Exercises connect/disconnect bounds, identity gating, concurrent-call
//! rejection and teardown through the public API with the mock transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embassy_time::Timer;
use futures_lite::future::{block_on, zip};
use roombalink::app::commands::{Command, CommandName};
use roombalink::app::events::DeviceEvent;
use roombalink::connection::ConnectionManager;
use roombalink::telemetry::{NotificationFilter, TelemetryFeed};
use roombalink::{Error, TransportError};
use serde_json::json;

use crate::mock_transport::{ConnectBehaviour, MockTransport, test_config};

type Manager = ConnectionManager<Arc<MockTransport>>;

fn manager(transport: MockTransport) -> (Manager, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let feed = transport.feed().clone();
    (
        ConnectionManager::new(test_config(), Arc::clone(&transport), feed),
        transport,
    )
}

fn identified(behaviour: ConnectBehaviour) -> MockTransport {
    MockTransport::new(TelemetryFeed::new(), behaviour)
        .with_identity(json!({"state": {"reported": {"name": "Rosie", "batPct": 88}}}))
}

// ── Connect ───────────────────────────────────────────────────

#[test]
fn connect_returns_robot_name_and_publishes_event() {
    let (mgr, _transport) = manager(identified(ConnectBehaviour::Accept));
    let mut sub = mgr.feed().bus().subscribe(NotificationFilter::Vacuum).unwrap();

    assert_eq!(block_on(mgr.connect()), Ok("Rosie".to_owned()));
    assert!(mgr.is_connected());
    assert_eq!(mgr.last_error(), None);

    let mut saw_connected = false;
    while let Some(event) = sub.try_next() {
        saw_connected |= event == DeviceEvent::Connected { name: "Rosie".into() };
    }
    assert!(saw_connected);
}

#[test]
fn connect_waits_for_identity_reported_later() {
    let (mgr, transport) = manager(MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept));
    let feed = transport.feed().clone();
    let reporter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(40));
        feed.ingest(&json!({"batPct": 70}));
        feed.ingest(&json!({"name": "Late Larry"}));
    });

    assert_eq!(block_on(mgr.connect()), Ok("Late Larry".to_owned()));
    reporter.join().unwrap();
}

#[test]
fn empty_name_does_not_count_as_identity() {
    let transport = MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept)
        .with_identity(json!({"name": ""}));
    let (mgr, transport) = manager(transport);
    assert_eq!(block_on(mgr.connect()), Err(Error::ConnectTimeout));
    assert_eq!(transport.disconnect_count(), 1);
}

#[test]
fn missing_identity_times_out_after_disconnecting() {
    let (mgr, transport) = manager(MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept));
    let mut sub = mgr.feed().bus().subscribe(NotificationFilter::All).unwrap();

    let started = Instant::now();
    assert_eq!(block_on(mgr.connect()), Err(Error::ConnectTimeout));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(transport.disconnect_count(), 1);
    assert!(!mgr.is_connected());
    assert_eq!(mgr.last_error(), Some(Error::ConnectTimeout));
    assert!(mgr.last_error().unwrap().is_retryable());
    assert_eq!(sub.try_next(), Some(DeviceEvent::ConnectFailed(Error::ConnectTimeout)));
}

#[test]
fn hanging_transport_is_bounded_by_connect_timeout() {
    let (mgr, transport) = manager(MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Hang));
    let started = Instant::now();
    assert_eq!(block_on(mgr.connect()), Err(Error::ConnectTimeout));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(transport.disconnect_count(), 1);
}

#[test]
fn refusal_fails_immediately_without_disconnect() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Refuse));
    let started = Instant::now();
    assert_eq!(
        block_on(mgr.connect()),
        Err(Error::ConnectFailure(TransportError::Refused("bad password".into())))
    );
    assert!(started.elapsed() < Duration::from_millis(150));
    assert_eq!(transport.disconnect_count(), 0);
    assert!(mgr.last_error().is_some_and(|e| e.is_retryable()));
}

#[test]
fn second_concurrent_connect_is_busy() {
    let (mgr, transport) = manager(MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Hang));
    let (first, second) = block_on(zip(mgr.connect(), mgr.connect()));
    assert_eq!(second, Err(Error::Busy("connect")));
    assert_eq!(first, Err(Error::ConnectTimeout));
    assert_eq!(transport.connect_count(), 1);
}

#[test]
fn connect_is_allowed_again_after_a_failure() {
    let (mgr, transport) = manager(MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept));
    assert_eq!(block_on(mgr.connect()), Err(Error::ConnectTimeout));
    transport.feed().ingest(&json!({"name": "Rosie"}));
    assert_eq!(block_on(mgr.connect()), Ok("Rosie".to_owned()));
    assert_eq!(mgr.last_error(), None);
    assert_eq!(transport.connect_count(), 2);
}

// ── Teardown ──────────────────────────────────────────────────

#[test]
fn shutdown_cancels_pending_connect() {
    let transport = MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept);
    let transport = Arc::new(transport);
    let mut config = test_config();
    config.connect_timeout_ms = 5_000;
    let mgr = ConnectionManager::new(config, Arc::clone(&transport), transport.feed().clone());

    let started = Instant::now();
    let (result, ()) = block_on(zip(mgr.connect(), async {
        Timer::after_millis(30).await;
        mgr.shutdown().await;
    }));
    assert_eq!(result, Err(Error::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));

    // Torn down for good.
    assert_eq!(block_on(mgr.connect()), Err(Error::Cancelled));
    assert_eq!(transport.connect_count(), 1);
}

// ── Disconnect ────────────────────────────────────────────────

#[test]
fn disconnect_clears_session_and_publishes_once() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Accept));
    block_on(mgr.connect()).unwrap();
    let mut sub = mgr.feed().bus().subscribe(NotificationFilter::All).unwrap();

    block_on(mgr.disconnect());
    block_on(mgr.disconnect());

    assert!(!mgr.is_connected());
    assert_eq!(transport.disconnect_count(), 2);
    assert_eq!(sub.try_next(), Some(DeviceEvent::Disconnected));
    assert_eq!(sub.try_next(), None);
}

#[test]
fn hanging_disconnect_is_bounded_and_not_an_error() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Accept));
    block_on(mgr.connect()).unwrap();
    transport.hang_on_disconnect();

    let started = Instant::now();
    block_on(mgr.disconnect());
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!mgr.is_connected());
}

#[test]
fn concurrent_disconnect_is_a_no_op() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Accept));
    block_on(mgr.connect()).unwrap();
    transport.hang_on_disconnect();

    block_on(zip(mgr.disconnect(), mgr.disconnect()));
    assert_eq!(transport.disconnect_count(), 1);
}

// ── Send ──────────────────────────────────────────────────────

#[test]
fn send_requires_a_connected_session() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Accept));
    assert_eq!(mgr.send(&Command::new(CommandName::Start)), Err(Error::NotConnected));
    assert!(transport.sent().is_empty());

    block_on(mgr.connect()).unwrap();
    let mut sub = mgr.feed().bus().subscribe(NotificationFilter::All).unwrap();
    mgr.send(&Command::new(CommandName::Start)).unwrap();
    assert_eq!(transport.sent_names(), ["start"]);
    assert_eq!(sub.try_next(), Some(DeviceEvent::CommandSent(CommandName::Start)));
}

#[test]
fn transport_rejection_surfaces_as_transport_error() {
    let (mgr, transport) = manager(identified(ConnectBehaviour::Accept));
    block_on(mgr.connect()).unwrap();
    transport.reject_next("busy");
    assert_eq!(
        mgr.send(&Command::new(CommandName::Find)),
        Err(Error::Transport(TransportError::Rejected("busy".into())))
    );
}
