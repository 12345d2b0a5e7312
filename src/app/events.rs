//! Outbound device events and the bus they travel on.
//!
//! Connection lifecycle changes and telemetry notifications are published
//! on a bounded `embassy-sync` pub/sub channel.  Publishing never blocks:
//! when a subscriber falls behind, its oldest pending events are dropped.
//!
//! ```text
//!  ConnectionManager ──┐
//!                      ├──▶ EventBus ──▶ FilteredSubscriber(NotificationFilter)
//!  TelemetryFeed ──────┘                 └─▶ EventSink (log, UI, …)
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Subscriber};
use log::warn;

use crate::app::commands::CommandName;
use crate::error::Error;
use crate::telemetry::{NotificationFilter, TouchedKeys};

/// Pending events buffered per subscriber.
const EVENT_DEPTH: usize = 16;

/// Concurrent subscribers per device.
pub const MAX_SUBSCRIBERS: usize = 4;

/// Registered publishers (immediate publishing does not take a slot).
const MAX_PUBLISHERS: usize = 1;

type EventChannel =
    PubSubChannel<CriticalSectionRawMutex, DeviceEvent, EVENT_DEPTH, MAX_SUBSCRIBERS, MAX_PUBLISHERS>;

type EventSubscriber<'a> =
    Subscriber<'a, CriticalSectionRawMutex, DeviceEvent, EVENT_DEPTH, MAX_SUBSCRIBERS, MAX_PUBLISHERS>;

/// Structured events emitted by the session layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The session is up and the robot has reported its name.
    Connected { name: String },
    /// A connect attempt failed.
    ConnectFailed(Error),
    /// The session went down.
    Disconnected,
    /// A telemetry report was merged into the store.
    Telemetry(TouchedKeys),
    /// A command left for the robot.
    CommandSent(CommandName),
}

impl DeviceEvent {
    /// Whether a subscriber with `filter` should be woken for this event.
    ///
    /// Lifecycle and command events always pass; only telemetry is filtered.
    pub fn passes(&self, filter: NotificationFilter) -> bool {
        match self {
            Self::Telemetry(touched) => filter.accepts(touched),
            _ => true,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Bus
// ───────────────────────────────────────────────────────────────

/// Per-device publish/subscribe channel.
pub struct EventBus {
    channel: EventChannel,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub const fn new() -> Self {
        Self {
            channel: PubSubChannel::new(),
        }
    }

    /// Publish without waiting; lagging subscribers lose their oldest event.
    pub fn publish(&self, event: DeviceEvent) {
        self.channel.immediate_publisher().publish_immediate(event);
    }

    /// Register a subscriber.  Fails once [`MAX_SUBSCRIBERS`] are live.
    pub fn subscribe(&self, filter: NotificationFilter) -> Result<FilteredSubscriber<'_>, Error> {
        match self.channel.subscriber() {
            Ok(inner) => Ok(FilteredSubscriber { inner, filter }),
            Err(e) => {
                warn!("event subscription refused: {:?}", e);
                Err(Error::Busy("event subscription"))
            }
        }
    }
}

/// A bus subscription that only yields events its filter accepts.
pub struct FilteredSubscriber<'a> {
    inner: EventSubscriber<'a>,
    filter: NotificationFilter,
}

impl FilteredSubscriber<'_> {
    /// Wait for the next accepted event.
    pub async fn next(&mut self) -> DeviceEvent {
        loop {
            let event = self.inner.next_message_pure().await;
            if event.passes(self.filter) {
                return event;
            }
        }
    }

    /// Next accepted event already queued, if any.
    pub fn try_next(&mut self) -> Option<DeviceEvent> {
        while let Some(event) = self.inner.try_next_message_pure() {
            if event.passes(self.filter) {
                return Some(event);
            }
        }
        None
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter
    }
}
