//! Telemetry ingest path used by transport adapters.
//!
//! Storage and notification are two separate steps:
//!
//! ```text
//!  transport ──▶ TelemetryFeed::ingest ──1──▶ TelemetryStore::update   (always)
//!                                      └─2──▶ EventBus::publish(Telemetry(touched))
//!                                                   │
//!                               subscriber-side NotificationFilter
//! ```
//!
//! Filtering (e.g. ignoring Wi-Fi signal-strength-only reports) therefore
//! only decides who gets *woken*; the store always holds the latest merge.

use std::sync::Arc;

use log::{debug, trace};
use serde_json::{Map, Value};

use super::{TelemetrySnapshot, TelemetryStore};
use crate::app::events::{DeviceEvent, EventBus};

// ---------------------------------------------------------------------------
// Touched keys
// ---------------------------------------------------------------------------

/// Summary of the top-level keys a single partial report carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchedKeys {
    /// Number of top-level keys in the report.
    pub count: usize,
    /// The report carried `signal` (Wi-Fi strength).
    pub signal: bool,
    /// The report carried `dock` (clean base status).
    pub dock: bool,
    /// The report carried `bin`.
    pub bin: bool,
}

impl TouchedKeys {
    pub fn of(partial: &Map<String, Value>) -> Self {
        Self {
            count: partial.len(),
            signal: partial.contains_key("signal"),
            dock: partial.contains_key("dock"),
            bin: partial.contains_key("bin"),
        }
    }

    /// Nothing but a signal-strength reading.
    pub fn is_signal_only(&self) -> bool {
        self.count == 1 && self.signal
    }
}

// ---------------------------------------------------------------------------
// Notification filters
// ---------------------------------------------------------------------------

/// Which telemetry notifications a subscriber wants to be woken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    /// Every notification.
    All,
    /// The vacuum itself: everything except signal-only reports.
    Vacuum,
    /// Clean base readings: reports that touch `dock`.
    CleanBase,
    /// Bin sensor: reports that touch `bin`.
    Bin,
}

impl NotificationFilter {
    pub fn accepts(self, touched: &TouchedKeys) -> bool {
        match self {
            Self::All => true,
            Self::Vacuum => !touched.is_signal_only(),
            Self::CleanBase => touched.dock,
            Self::Bin => touched.bin,
        }
    }
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Cloneable handle a transport uses to push telemetry in.
#[derive(Clone, Default)]
pub struct TelemetryFeed {
    store: Arc<TelemetryStore>,
    bus: Arc<EventBus>,
}

impl TelemetryFeed {
    /// A feed with a fresh, empty store and event bus.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Ingest one transport message.
    ///
    /// Accepts either the full `{"state": {"reported": {...}}}` envelope or
    /// the reported object itself.  Non-object messages are ignored.
    pub fn ingest(&self, message: &Value) -> Option<TouchedKeys> {
        let Some(reported) = reported_of(message) else {
            debug!("ignoring non-object telemetry message");
            return None;
        };
        Some(self.ingest_reported(reported))
    }

    /// Merge an already-unwrapped reported object, then notify.
    pub fn ingest_reported(&self, reported: &Map<String, Value>) -> TouchedKeys {
        let snapshot: Arc<TelemetrySnapshot> = self.store.update(reported);
        let touched = TouchedKeys::of(reported);
        trace!(
            "telemetry rev {} touched {} keys (signal_only={})",
            snapshot.revision(),
            touched.count,
            touched.is_signal_only()
        );
        self.bus.publish(DeviceEvent::Telemetry(touched));
        touched
    }
}

fn reported_of(message: &Value) -> Option<&Map<String, Value>> {
    let obj = message.as_object()?;
    let envelope = obj
        .get("state")
        .and_then(|state| state.get("reported"))
        .and_then(Value::as_object);
    Some(envelope.unwrap_or(obj))
}
