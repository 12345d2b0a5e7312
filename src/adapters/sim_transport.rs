//! Simulated robot transport.
//!
//! Implements [`TransportPort`] against an in-process robot model that
//! reacts to commands and pushes telemetry into a [`TelemetryFeed`] the way
//! a real robot does: partial reports, a signal-strength chatter report on
//! every tick, and the identity only once the first full report lands.
//!
//! Drive it by calling [`SimulatedRobot::tick`] periodically.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info};
use serde_json::{Value, json};

use crate::app::commands::{Command, CommandName};
use crate::app::ports::TransportPort;
use crate::config::SessionConfig;
use crate::error::TransportError;
use crate::telemetry::TelemetryFeed;

/// Rooms known on the simulated robot's stored map.
const KNOWN_ROOMS: &[&str] = &["1", "2", "3", "4", "5", "6"];

/// Stored map id reported in `pmaps`.
pub const SIM_MAP_ID: &str = "SimMap01";

/// Ticks spent travelling home before the robot reports charging.
const DOCKING_TICKS: u32 = 3;

#[derive(Debug)]
struct RobotModel {
    phase: &'static str,
    cycle: &'static str,
    bat_pct: i64,
    mission_minutes: i64,
    mission_sqft: i64,
    lifetime_minutes: i64,
    lifetime_sqft: i64,
    missions: i64,
    docking_ticks: u32,
    rssi: i64,
    last_command: Value,
}

impl RobotModel {
    fn new() -> Self {
        Self {
            phase: "charge",
            cycle: "none",
            bat_pct: 100,
            mission_minutes: 0,
            mission_sqft: 0,
            lifetime_minutes: 245,
            lifetime_sqft: 3_120,
            missions: 17,
            docking_ticks: 0,
            rssi: -48,
            last_command: Value::Null,
        }
    }

    fn mission_report(&self) -> Value {
        json!({
            "cleanMissionStatus": {
                "phase": self.phase,
                "cycle": self.cycle,
                "mssnM": self.mission_minutes,
                "sqft": self.mission_sqft,
                "initiator": "localApp",
                "notReady": 0,
                "error": 0,
            },
            "batPct": self.bat_pct,
        })
    }

    fn full_report(&self, name: &str) -> Value {
        let mut report = self.mission_report();
        if let Some(obj) = report.as_object_mut() {
            obj.insert("name".into(), json!(name));
            obj.insert("sku".into(), json!("R980020"));
            obj.insert("softwareVer".into(), json!("v2.4.16-126"));
            obj.insert("mac".into(), json!("50:14:79:00:00:01"));
            obj.insert("cap".into(), json!({"pose": 1, "carpetBoost": 1}));
            obj.insert("bin".into(), json!({"present": true, "full": false}));
            obj.insert("pmaps".into(), json!([{ SIM_MAP_ID: "231001T120000" }]));
            obj.insert(
                "bbrun".into(),
                json!({
                    "hr": self.lifetime_minutes / 60,
                    "min": self.lifetime_minutes % 60,
                    "sqft": self.lifetime_sqft,
                    "nMssn": self.missions,
                    "nScrubs": 52,
                    "nEvacs": 0,
                }),
            );
            obj.insert("pose".into(), json!({"point": {"x": self.mission_sqft, "y": -12}, "theta": 90}));
        }
        report
    }

    /// Advance one simulated minute.
    fn advance(&mut self) {
        match self.phase {
            "run" => {
                self.mission_minutes += 1;
                self.lifetime_minutes += 1;
                self.mission_sqft += 4;
                self.lifetime_sqft += 4;
                self.bat_pct = (self.bat_pct - 2).max(0);
            }
            "hmUsrDock" => {
                self.docking_ticks += 1;
                if self.docking_ticks >= DOCKING_TICKS {
                    self.phase = "charge";
                    self.cycle = "none";
                    self.docking_ticks = 0;
                }
            }
            "charge" => self.bat_pct = (self.bat_pct + 5).min(100),
            _ => {}
        }
        self.rssi = if self.rssi <= -60 { -45 } else { self.rssi - 1 };
    }

    fn apply(&mut self, command: &Command) -> Result<(), TransportError> {
        match &command.name {
            CommandName::Start => {
                self.phase = "run";
                self.cycle = "clean";
                self.mission_minutes = 0;
                self.mission_sqft = 0;
                self.missions += 1;
            }
            CommandName::Resume => self.phase = "run",
            CommandName::Pause => self.phase = "pause",
            CommandName::Stop => {
                self.phase = "stop";
                self.cycle = "none";
            }
            CommandName::Dock => {
                self.phase = "hmUsrDock";
                self.docking_ticks = 0;
            }
            CommandName::Find => {}
            CommandName::CleanRooms => {
                validate_regions(command)?;
                self.phase = "run";
                self.cycle = "clean";
                self.missions += 1;
            }
            CommandName::Raw(name) => {
                return Err(TransportError::Rejected(format!("unsupported command '{name}'")));
            }
        }
        self.last_command = json!({
            "command": command.name.as_str(),
            "initiator": "localApp",
        });
        if let (Some(params), Some(last)) = (&command.params, self.last_command.as_object_mut()) {
            for (k, v) in params {
                last.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

fn validate_regions(command: &Command) -> Result<(), TransportError> {
    let params = command.params.as_ref();
    if let Some(map) = params.and_then(|p| p.get("pmap_id")).and_then(Value::as_str) {
        if map != SIM_MAP_ID {
            return Err(TransportError::Rejected(format!("unknown map '{map}'")));
        }
    }
    let regions = params
        .and_then(|p| p.get("regions"))
        .and_then(Value::as_array)
        .ok_or_else(|| TransportError::Rejected("missing regions".into()))?;
    for region in regions {
        let id = region.get("region_id").and_then(Value::as_str).unwrap_or_default();
        if !KNOWN_ROOMS.contains(&id) {
            return Err(TransportError::Rejected(format!("unknown region '{id}'")));
        }
    }
    Ok(())
}

/// In-process stand-in for a networked robot.
pub struct SimulatedRobot {
    name: String,
    feed: TelemetryFeed,
    model: BlockingMutex<CriticalSectionRawMutex, RefCell<RobotModel>>,
    connected: AtomicBool,
}

impl SimulatedRobot {
    pub fn new(name: impl Into<String>, feed: TelemetryFeed) -> Self {
        Self {
            name: name.into(),
            feed,
            model: BlockingMutex::new(RefCell::new(RobotModel::new())),
            connected: AtomicBool::new(false),
        }
    }

    /// Advance the model and push this tick's telemetry.  No-op while
    /// disconnected.
    pub fn tick(&self) {
        if !self.connected.load(Ordering::Acquire) {
            return;
        }
        let (full, rssi) = self.model.lock(|m| {
            let mut m = m.borrow_mut();
            m.advance();
            (m.full_report(&self.name), m.rssi)
        });
        self.feed.ingest(&json!({"state": {"reported": full}}));
        self.feed
            .ingest(&json!({"state": {"reported": {"signal": {"rssi": rssi}}}}));
    }

    /// Current simulated phase, for assertions and demos.
    pub fn phase(&self) -> &'static str {
        self.model.lock(|m| m.borrow().phase)
    }
}

impl TransportPort for SimulatedRobot {
    async fn connect(&self, session: &SessionConfig) -> Result<(), TransportError> {
        if session.password.expose().is_empty() {
            return Err(TransportError::Refused("authentication failed".into()));
        }
        info!("sim: robot {} accepting session from {}", session.blid, session.address);
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::Release);
        debug!("sim: session closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&self, command: &Command) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let report = self.model.lock(|m| {
            let mut m = m.borrow_mut();
            m.apply(command)?;
            let mut report = m.mission_report();
            if let Some(obj) = report.as_object_mut() {
                obj.insert("lastCommand".into(), m.last_command.clone());
            }
            Ok::<_, TransportError>(report)
        })?;
        debug!("sim: applied {}", command);
        self.feed.ingest(&json!({"state": {"reported": report}}));
        Ok(())
    }
}
