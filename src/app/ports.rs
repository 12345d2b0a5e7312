//! Port traits: the hexagonal boundary between session logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RoombaService (domain)
//! ```
//!
//! Driven adapters (the robot transport, wall clock, event sinks) implement
//! these traits.  The [`RoombaService`](super::service::RoombaService)
//! consumes them via generics, so the domain core never touches a socket.
//!
//! ## Transport contract
//!
//! - `connect` returns once the connection attempt has been *started*
//!   (or refused).  The session layer then waits for telemetry carrying the
//!   robot's name before it considers the session up.
//! - Incoming telemetry is pushed into the
//!   [`TelemetryFeed`](crate::telemetry::TelemetryFeed) the adapter was
//!   built with.  Ports never return telemetry directly.
//! - `send` is fire-and-forget: `Ok` means "handed to the wire".

use std::sync::Arc;

use crate::app::commands::Command;
use crate::app::events::DeviceEvent;
use crate::config::SessionConfig;
use crate::error::TransportError;

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ robot)
// ───────────────────────────────────────────────────────────────

/// Robot connection, as seen by the session layer.
pub trait TransportPort {
    /// Begin a session using the caller's address and credentials.
    async fn connect(&self, session: &SessionConfig) -> Result<(), TransportError>;

    /// Tear the session down.  May be called when already disconnected.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Whether the underlying link is currently up.
    fn is_connected(&self) -> bool;

    /// Hand one command to the robot.
    fn send(&self, command: &Command) -> Result<(), TransportError>;
}

impl<T: TransportPort> TransportPort for Arc<T> {
    async fn connect(&self, session: &SessionConfig) -> Result<(), TransportError> {
        (**self).connect(session).await
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        (**self).disconnect().await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&self, command: &Command) -> Result<(), TransportError> {
        (**self).send(command)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: wall clock → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for elapsed-job computations.
pub trait ClockPort {
    /// Current time in seconds since the Unix epoch.
    fn now_epoch_secs(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// Somewhere to forward [`DeviceEvent`]s drained from the bus.
/// Adapters decide where they go (log, UI, metrics).
pub trait EventSink {
    fn emit(&mut self, event: &DeviceEvent);
}
