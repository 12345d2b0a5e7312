//! Device identity and the auxiliary sensor readings derived from telemetry.

use serde::Serialize;

use crate::config::SessionConfig;
use crate::interpreter::LifecycleState;
use crate::telemetry::TelemetrySnapshot;

/// Hardware family, chosen from capability hints in the telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RobotVariant {
    /// Mopping robot (reports a detected pad).
    Braava,
    /// Vacuum with carpet boost.
    CarpetBoost,
    Standard,
}

impl RobotVariant {
    pub fn detect(snapshot: &TelemetrySnapshot) -> Self {
        if snapshot.contains("detectedPad") {
            Self::Braava
        } else if snapshot.i64_at("cap.carpetBoost") == Some(1) {
            Self::CarpetBoost
        } else {
            Self::Standard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub unique_id: String,
    pub manufacturer: &'static str,
    pub name: Option<String>,
    pub sw_version: Option<String>,
    pub model: Option<String>,
    pub mac: Option<String>,
    pub variant: RobotVariant,
    /// Robot reports its position (`cap.pose == 1`).
    pub has_position: bool,
}

impl DeviceInfo {
    pub fn from_snapshot(config: &SessionConfig, snapshot: &TelemetrySnapshot) -> Self {
        let owned = |path: &str| snapshot.str_at(path).map(str::to_owned);
        Self {
            unique_id: config.unique_id(),
            manufacturer: "iRobot",
            name: owned("name"),
            sw_version: owned("softwareVer"),
            model: owned("sku"),
            mac: owned("hwPartsRev.wlan0HwAddr").or_else(|| owned("mac")),
            variant: RobotVariant::detect(snapshot),
            has_position: snapshot.i64_at("cap.pose") == Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryReading {
    pub level: Option<i64>,
    pub charging: bool,
}

impl BatteryReading {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot, state: LifecycleState) -> Self {
        Self {
            level: snapshot.i64_at("batPct"),
            charging: state == LifecycleState::Docked,
        }
    }
}

const DOCK_STATES: &[(i64, &str)] = &[
    (300, "Ready"),
    (301, "Ready"),
    (302, "Empty"),
    (303, "Empty"),
    (350, "Bag Missing"),
    (351, "Clogged"),
    (352, "Sealing Problem"),
    (353, "Bag Full"),
    (360, "Comms Problem"),
];

/// Self-emptying clean base status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanBaseReading {
    pub code: Option<i64>,
    pub status: &'static str,
    pub part_number: Option<String>,
    pub firmware: Option<String>,
}

impl CleanBaseReading {
    /// `None` unless the robot reports a `dock` group.
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Option<Self> {
        if !snapshot.contains("dock") {
            return None;
        }
        let code = snapshot.i64_at("dock.state");
        let status = code
            .and_then(|c| DOCK_STATES.iter().find(|(k, _)| *k == c))
            .map_or("Unknown", |(_, text)| *text);
        Some(Self {
            code,
            status,
            part_number: snapshot.str_at("dock.pn").map(str::to_owned),
            firmware: snapshot.str_at("dock.fwVer").map(str::to_owned),
        })
    }
}

/// `Some(full)` once the robot reports `bin.full`, `None` otherwise.
pub fn bin_full(snapshot: &TelemetrySnapshot) -> Option<bool> {
    if !snapshot.contains("bin.full") {
        return None;
    }
    Some(snapshot.bool_at("bin.full").unwrap_or(false))
}
