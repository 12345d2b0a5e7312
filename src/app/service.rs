//! Application service: the per-robot facade.
//!
//! [`RoombaService`] owns one telemetry feed, one session and the pure
//! interpreters that read from it.  All I/O flows through port traits
//! injected at construction, making the whole service testable with a mock
//! transport.
//!
//! ```text
//!  TransportPort ──▶ ┌──────────────────────────────┐ ──▶ EventBus
//!                    │        RoombaService          │
//!      ClockPort ──▶ │ Session · Interpreter · Stats │ ◀── AppCommand
//!                    └──────────────────────────────┘
//! ```

use std::sync::Arc;

use log::info;

use crate::attributes::StateAttributes;
use crate::config::SessionConfig;
use crate::connection::ConnectionManager;
use crate::device::{self, BatteryReading, CleanBaseReading, DeviceInfo};
use crate::dispatcher::CommandDispatcher;
use crate::error::Result;
use crate::interpreter::{Interpretation, LifecycleState, StateInterpreter};
use crate::rooms::RoomCleaningService;
use crate::statistics::{StatisticsAggregator, StatisticsSnapshot};
use crate::telemetry::{NotificationFilter, TelemetryFeed, TelemetrySnapshot};

use super::commands::AppCommand;
use super::events::FilteredSubscriber;
use super::ports::{ClockPort, TransportPort};

// ───────────────────────────────────────────────────────────────
// RoombaService
// ───────────────────────────────────────────────────────────────

pub struct RoombaService<T: TransportPort, C: ClockPort> {
    connection: ConnectionManager<T>,
    interpreter: StateInterpreter,
    statistics: StatisticsAggregator,
    clock: C,
}

impl<T: TransportPort, C: ClockPort> RoombaService<T, C> {
    /// Validate `config` and assemble the service.
    ///
    /// `feed` must be the feed `transport` pushes telemetry into.  Does
    /// **not** connect; call [`connect`](Self::connect) next.
    pub fn new(config: SessionConfig, transport: T, feed: TelemetryFeed, clock: C) -> Result<Self> {
        config.validate()?;
        let interpreter = StateInterpreter::new(&config);
        let statistics = StatisticsAggregator::new(config.unit_system);
        Ok(Self {
            connection: ConnectionManager::new(config, transport, feed),
            interpreter,
            statistics,
            clock,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub async fn connect(&self) -> Result<String> {
        self.connection.connect().await
    }

    pub async fn shutdown(&self) {
        self.connection.shutdown().await;
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn dispatcher(&self) -> CommandDispatcher<'_, T> {
        CommandDispatcher::new(&self.connection)
    }

    pub fn rooms(&self) -> RoomCleaningService<'_, T> {
        RoomCleaningService::new(self.dispatcher())
    }

    /// Process a caller request.
    pub async fn handle_command(&self, cmd: AppCommand) -> Result<()> {
        info!("command: {:?}", cmd);
        let dispatcher = self.dispatcher();
        match cmd {
            AppCommand::Start => dispatcher.start(),
            AppCommand::Stop => dispatcher.stop(),
            AppCommand::Pause => dispatcher.pause(),
            AppCommand::Locate => dispatcher.locate(),
            AppCommand::ReturnToBase => dispatcher.return_to_base().await,
            AppCommand::CleanRooms { map_id, regions } => self.rooms().clean_rooms(map_id, &regions),
            AppCommand::Send { name, params } => dispatcher.send_command(&name, params),
        }
    }

    // ── Telemetry views ───────────────────────────────────────

    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.connection.feed().store().snapshot()
    }

    pub fn state(&self) -> LifecycleState {
        self.interpreter.state(&self.snapshot())
    }

    pub fn interpret(&self) -> Interpretation {
        self.interpreter.interpret(&self.snapshot())
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        let snapshot = self.snapshot();
        let state = self.interpreter.state(&snapshot);
        self.statistics
            .aggregate(&snapshot, state, self.clock.now_epoch_secs())
    }

    /// All views below are computed from one snapshot.
    pub fn attributes(&self) -> StateAttributes {
        let snapshot = self.snapshot();
        let interpretation = self.interpreter.interpret(&snapshot);
        let statistics =
            self.statistics
                .aggregate(&snapshot, interpretation.state, self.clock.now_epoch_secs());
        StateAttributes::build(&snapshot, &interpretation, &statistics)
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::from_snapshot(self.connection.config(), &self.snapshot())
    }

    pub fn battery(&self) -> BatteryReading {
        let snapshot = self.snapshot();
        BatteryReading::from_snapshot(&snapshot, self.interpreter.state(&snapshot))
    }

    pub fn clean_base(&self) -> Option<CleanBaseReading> {
        CleanBaseReading::from_snapshot(&self.snapshot())
    }

    pub fn bin_full(&self) -> Option<bool> {
        device::bin_full(&self.snapshot())
    }

    // ── Events ────────────────────────────────────────────────

    pub fn subscribe(&self, filter: NotificationFilter) -> Result<FilteredSubscriber<'_>> {
        self.connection.feed().bus().subscribe(filter)
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }
}
