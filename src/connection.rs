//! Connection lifecycle for one robot session.
//!
//! ```text
//!            connect()                          identity seen
//!  Disconnected ──────▶ transport.connect ──▶ wait(poll) ──────────▶ Connected
//!       ▲                     │ refused           │ timeout               │
//!       │                     ▼                   ▼                       │
//!       │              ConnectFailure    disconnect → ConnectTimeout      │
//!       └──────────────────────────── disconnect() ◀──────────────────────┘
//! ```
//!
//! A session only counts as up once the transport reports connected *and*
//! the telemetry store holds the robot's name; before that, nothing about
//! the robot is known.  At most one connect and one disconnect run at a
//! time.  [`ConnectionManager::shutdown`] fires the teardown signal so that
//! every pending wait returns [`Error::Cancelled`].

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Timer, with_timeout};
use futures_lite::future;
use log::{debug, info, warn};

use crate::app::commands::Command;
use crate::app::events::DeviceEvent;
use crate::app::ports::TransportPort;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::telemetry::TelemetryFeed;
use crate::teardown::{Teardown, to_embassy};

/// Marks an operation as in flight for as long as the guard lives.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the transport session for one robot.
pub struct ConnectionManager<T: TransportPort> {
    config: SessionConfig,
    transport: T,
    feed: TelemetryFeed,
    connected: AtomicBool,
    connecting: AtomicBool,
    disconnecting: AtomicBool,
    last_error: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<Error>>>,
    teardown: Teardown,
}

impl<T: TransportPort> ConnectionManager<T> {
    /// `feed` must be the same feed the transport pushes telemetry into.
    pub fn new(config: SessionConfig, transport: T, feed: TelemetryFeed) -> Self {
        Self {
            config,
            transport,
            feed,
            connected: AtomicBool::new(false),
            connecting: AtomicBool::new(false),
            disconnecting: AtomicBool::new(false),
            last_error: BlockingMutex::new(RefCell::new(None)),
            teardown: Teardown::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open the session and wait for the robot to identify itself.
    ///
    /// Returns the robot's reported name.
    pub async fn connect(&self) -> Result<String> {
        if self.teardown.is_fired() {
            return Err(Error::Cancelled);
        }
        let Some(_guard) = InFlight::acquire(&self.connecting) else {
            warn!("connect to {} rejected: already connecting", self.config.address);
            return Err(Error::Busy("connect"));
        };
        if self.is_connected() {
            if let Some(name) = self.feed.store().snapshot().identity_name() {
                debug!("already connected to {}", name);
                return Ok(name.to_owned());
            }
        }

        info!(
            "connecting to {} (blid {}, timeout {:?})",
            self.config.address,
            self.config.blid,
            self.config.connect_timeout()
        );

        let attempt = with_timeout(
            to_embassy(self.config.connect_timeout()),
            self.open_and_wait_for_identity(),
        );
        let outcome = future::or(async { Some(attempt.await) }, async {
            self.teardown.wait().await;
            None
        })
        .await;

        let result = match outcome {
            None => Err(Error::Cancelled),
            Some(Ok(result)) => result,
            Some(Err(_)) => {
                warn!("robot at {} never reported its identity", self.config.address);
                self.disconnect().await;
                Err(Error::ConnectTimeout)
            }
        };

        match &result {
            Ok(name) => {
                self.connected.store(true, Ordering::Release);
                self.last_error.lock(|e| e.borrow_mut().take());
                info!("connected to {} at {}", name, self.config.address);
                self.feed.bus().publish(DeviceEvent::Connected { name: name.clone() });
            }
            Err(e) => {
                warn!("connect to {} failed: {}", self.config.address, e);
                self.last_error.lock(|slot| *slot.borrow_mut() = Some(e.clone()));
                self.feed.bus().publish(DeviceEvent::ConnectFailed(e.clone()));
            }
        }
        result
    }

    async fn open_and_wait_for_identity(&self) -> Result<String> {
        self.transport
            .connect(&self.config)
            .await
            .map_err(Error::ConnectFailure)?;

        let poll = to_embassy(self.config.poll_interval());
        loop {
            if self.transport.is_connected() {
                if let Some(name) = self.feed.store().snapshot().identity_name() {
                    return Ok(name.to_owned());
                }
            }
            debug!("waiting for robot identity");
            Timer::after(poll).await;
        }
    }

    /// Best-effort disconnect, bounded by the disconnect timeout.
    ///
    /// Failures are logged; the session is considered down afterwards.
    pub async fn disconnect(&self) {
        let Some(_guard) = InFlight::acquire(&self.disconnecting) else {
            debug!("disconnect already in progress");
            return;
        };

        match with_timeout(
            to_embassy(self.config.disconnect_timeout()),
            self.transport.disconnect(),
        )
        .await
        {
            Ok(Ok(())) => debug!("transport closed"),
            Ok(Err(e)) => warn!("disconnect failed: {}", e),
            Err(_) => warn!("{}", Error::DisconnectTimeout),
        }

        if self.connected.swap(false, Ordering::AcqRel) {
            info!("disconnected from {}", self.config.address);
            self.feed.bus().publish(DeviceEvent::Disconnected);
        }
    }

    /// Cancel every pending wait, then disconnect.  Further connects fail.
    pub async fn shutdown(&self) {
        info!("shutting down session with {}", self.config.address);
        self.teardown.fire();
        self.disconnect().await;
    }

    // ── Commands ──────────────────────────────────────────────

    /// Hand a command to the transport.  Does not wait for the robot.
    pub fn send(&self, command: &Command) -> Result<()> {
        if !self.is_connected() {
            debug!("dropping '{}': not connected", command.name);
            return Err(Error::NotConnected);
        }
        debug!("-> {}", command);
        self.transport.send(command)?;
        self.feed
            .bus()
            .publish(DeviceEvent::CommandSent(command.name.clone()));
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && self.transport.is_connected()
    }

    /// Error from the most recent failed connect, cleared on success.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.lock(|e| e.borrow().clone())
    }

    pub fn teardown(&self) -> &Teardown {
        &self.teardown
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn feed(&self) -> &TelemetryFeed {
        &self.feed
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
