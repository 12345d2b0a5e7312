//! Mock robot transport for integration tests.
//!
//! Records every command sent so tests can assert on the full command
//! history, and can be told how to behave on connect and how to answer
//! individual commands with telemetry.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use roombalink::TransportError;
use roombalink::app::commands::{Command, CommandName};
use roombalink::app::ports::TransportPort;
use roombalink::config::{Password, SessionConfig};
use roombalink::telemetry::TelemetryFeed;
use serde_json::Value;

/// Short timings so the suite stays fast.
pub fn test_config() -> SessionConfig {
    let mut config = SessionConfig::new("10.0.0.40", "TESTBLID", Password::new("secret"));
    config.poll_interval_ms = 10;
    config.connect_timeout_ms = 200;
    config.disconnect_timeout_ms = 50;
    config.dock_wait_attempts = 5;
    config
}

// ── Connect behaviour ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehaviour {
    /// Link comes up immediately.
    Accept,
    /// Credentials rejected.
    Refuse,
    /// `connect` never resolves.
    Hang,
}

// ── MockTransport ─────────────────────────────────────────────

pub struct MockTransport {
    feed: TelemetryFeed,
    behaviour: ConnectBehaviour,
    /// Reported on a successful connect, like a robot's first full report.
    identity: Option<Value>,
    connected: AtomicBool,
    disconnect_hangs: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    sent: Mutex<Vec<Command>>,
    reactions: Mutex<Vec<(CommandName, Value)>>,
    reject_next: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(feed: TelemetryFeed, behaviour: ConnectBehaviour) -> Self {
        Self {
            feed,
            behaviour,
            identity: None,
            connected: AtomicBool::new(false),
            disconnect_hangs: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            reject_next: Mutex::new(None),
        }
    }

    pub fn with_identity(mut self, report: Value) -> Self {
        self.identity = Some(report);
        self
    }

    /// Ingest `report` whenever `name` is sent.
    pub fn react(&self, name: CommandName, report: Value) {
        self.reactions.lock().unwrap().push((name, report));
    }

    /// Fail the next send with `TransportError::Rejected(reason)`.
    pub fn reject_next(&self, reason: &str) {
        *self.reject_next.lock().unwrap() = Some(reason.to_owned());
    }

    pub fn hang_on_disconnect(&self) {
        self.disconnect_hangs.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_names(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|c| c.name.as_str().to_owned())
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn feed(&self) -> &TelemetryFeed {
        &self.feed
    }
}

impl TransportPort for MockTransport {
    async fn connect(&self, _session: &SessionConfig) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            ConnectBehaviour::Refuse => Err(TransportError::Refused("bad password".into())),
            ConnectBehaviour::Hang => core::future::pending().await,
            ConnectBehaviour::Accept => {
                self.connected.store(true, Ordering::SeqCst);
                if let Some(report) = &self.identity {
                    self.feed.ingest(report);
                }
                Ok(())
            }
        }
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        if self.disconnect_hangs.load(Ordering::SeqCst) {
            core::future::pending::<()>().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, command: &Command) -> Result<(), TransportError> {
        if let Some(reason) = self.reject_next.lock().unwrap().take() {
            return Err(TransportError::Rejected(reason));
        }
        self.sent.lock().unwrap().push(command.clone());
        let reaction = self
            .reactions
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| *name == command.name)
            .map(|(_, report)| report.clone());
        if let Some(report) = reaction {
            self.feed.ingest(&report);
        }
        Ok(())
    }
}
