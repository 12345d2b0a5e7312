//! Integration tests for command dispatch and the return-to-base sequence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embassy_time::Timer;
use futures_lite::future::{block_on, zip};
use roombalink::Error;
use roombalink::app::commands::CommandName;
use roombalink::connection::ConnectionManager;
use roombalink::dispatcher::CommandDispatcher;
use roombalink::telemetry::TelemetryFeed;
use serde_json::{Value, json};

use crate::mock_transport::{ConnectBehaviour, MockTransport, test_config};

type Manager = ConnectionManager<Arc<MockTransport>>;

/// A connected session whose robot reports `phase`/`cycle`.
fn connected(phase: &str, cycle: &str) -> (Manager, Arc<MockTransport>) {
    connected_with(test_config(), phase, cycle)
}

fn connected_with(config: roombalink::config::SessionConfig, phase: &str, cycle: &str) -> (Manager, Arc<MockTransport>) {
    let transport = MockTransport::new(TelemetryFeed::new(), ConnectBehaviour::Accept).with_identity(json!({
        "name": "Rosie",
        "cleanMissionStatus": {"phase": phase, "cycle": cycle}
    }));
    let transport = Arc::new(transport);
    let mgr = ConnectionManager::new(config, Arc::clone(&transport), transport.feed().clone());
    block_on(mgr.connect()).unwrap();
    (mgr, transport)
}

fn phase_report(phase: &str) -> Value {
    json!({"state": {"reported": {"cleanMissionStatus": {"phase": phase}}}})
}

#[test]
fn start_resumes_a_paused_mission() {
    let (mgr, transport) = connected("pause", "clean");
    CommandDispatcher::new(&mgr).start().unwrap();
    assert_eq!(transport.sent_names(), ["resume"]);
}

#[test]
fn start_from_dock_sends_start() {
    let (mgr, transport) = connected("charge", "none");
    CommandDispatcher::new(&mgr).start().unwrap();
    assert_eq!(transport.sent_names(), ["start"]);
}

#[test]
fn docked_mid_cycle_counts_as_paused() {
    let (mgr, transport) = connected("charge", "clean");
    CommandDispatcher::new(&mgr).start().unwrap();
    assert_eq!(transport.sent_names(), ["resume"]);
}

#[test]
fn passthrough_commands() {
    let (mgr, transport) = connected("run", "clean");
    let d = CommandDispatcher::new(&mgr);
    d.stop().unwrap();
    d.pause().unwrap();
    d.locate().unwrap();
    assert_eq!(transport.sent_names(), ["stop", "pause", "find"]);
}

#[test]
fn raw_commands_travel_verbatim() {
    let (mgr, transport) = connected("charge", "none");
    let params = json!({"carpetBoost": true}).as_object().cloned();
    CommandDispatcher::new(&mgr)
        .send_command("evac", params.clone())
        .unwrap();
    let sent = transport.sent();
    assert_eq!(sent[0].name, CommandName::Raw("evac".into()));
    assert_eq!(sent[0].params, params);
}

#[test]
fn commands_fail_when_disconnected() {
    let (mgr, transport) = connected("run", "clean");
    block_on(mgr.disconnect());
    let d = CommandDispatcher::new(&mgr);
    assert_eq!(d.start(), Err(Error::NotConnected));
    assert_eq!(block_on(d.return_to_base()), Err(Error::NotConnected));
    assert!(transport.sent().is_empty());
}

// ── Return to base ────────────────────────────────────────────

#[test]
fn return_to_base_pauses_then_docks() {
    let (mgr, transport) = connected("run", "clean");
    transport.react(CommandName::Pause, phase_report("pause"));

    let started = Instant::now();
    block_on(CommandDispatcher::new(&mgr).return_to_base()).unwrap();
    assert_eq!(transport.sent_names(), ["pause", "dock"]);
    // Paused was visible at the first poll.
    assert!(started.elapsed() < Duration::from_millis(40));
}

#[test]
fn return_to_base_docks_even_if_pause_never_lands() {
    let (mgr, transport) = connected("run", "clean");

    let started = Instant::now();
    block_on(CommandDispatcher::new(&mgr).return_to_base()).unwrap();
    assert_eq!(transport.sent_names(), ["pause", "dock"]);
    // Five polls of 10 ms.
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[test]
fn return_to_base_notices_a_late_pause() {
    let (mgr, transport) = connected("run", "clean");
    let feed = transport.feed().clone();
    let d = CommandDispatcher::new(&mgr);

    let (result, ()) = block_on(zip(d.return_to_base(), async {
        Timer::after_millis(15).await;
        feed.ingest(&phase_report("pause"));
    }));
    result.unwrap();
    assert_eq!(transport.sent_names(), ["pause", "dock"]);
}

#[test]
fn return_to_base_from_idle_only_docks() {
    let (mgr, transport) = connected("stop", "none");
    block_on(CommandDispatcher::new(&mgr).return_to_base()).unwrap();
    assert_eq!(transport.sent_names(), ["dock"]);
}

#[test]
fn teardown_aborts_the_dock_wait() {
    let mut config = test_config();
    config.dock_wait_attempts = 1_000;
    let (mgr, transport) = connected_with(config, "run", "clean");
    let d = CommandDispatcher::new(&mgr);

    let started = Instant::now();
    let (result, ()) = block_on(zip(d.return_to_base(), async {
        Timer::after_millis(30).await;
        mgr.shutdown().await;
    }));
    assert_eq!(result, Err(Error::Cancelled));
    assert_eq!(transport.sent_names(), ["pause"]);
    assert!(started.elapsed() < Duration::from_secs(2));
}
