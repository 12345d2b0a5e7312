//! Telemetry → operational state.
//!
//! Pure functions over a [`TelemetrySnapshot`]: the same snapshot always
//! yields the same [`Interpretation`].  Unknown phases and codes never fail;
//! they degrade to [`LifecycleState::Error`] or placeholder text.
//!
//! | phase       | state     | status text    |
//! |-------------|-----------|----------------|
//! | `""`        | Idle      | None           |
//! | `charge`    | Docked    | Charging       |
//! | `evac`      | Returning | Emptying       |
//! | `hmMidMsn`  | Cleaning  | Recharging     |
//! | `hmPostMsn` | Returning | End Mission    |
//! | `hmUsrDock` | Returning | User Docking   |
//! | `pause`     | Paused    | Paused         |
//! | `run`       | Cleaning  | Running        |
//! | `stop`      | Idle      | Stopped        |
//! | `stuck`     | Error     | Stuck          |
//!
//! A mission cycle other than `none` turns Idle/Docked into Paused.

use core::fmt;

use serde::Serialize;

use crate::config::SessionConfig;
use crate::telemetry::TelemetrySnapshot;

/// Normalized robot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Idle,
    Cleaning,
    Paused,
    Returning,
    Docked,
    Error,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cleaning => "cleaning",
            Self::Paused => "paused",
            Self::Returning => "returning",
            Self::Docked => "docked",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const PHASE_STATES: &[(&str, LifecycleState)] = &[
    ("", LifecycleState::Idle),
    ("charge", LifecycleState::Docked),
    ("evac", LifecycleState::Returning),
    ("hmMidMsn", LifecycleState::Cleaning),
    ("hmPostMsn", LifecycleState::Returning),
    ("hmUsrDock", LifecycleState::Returning),
    ("pause", LifecycleState::Paused),
    ("run", LifecycleState::Cleaning),
    ("stop", LifecycleState::Idle),
    ("stuck", LifecycleState::Error),
];

const PHASE_STATUS: &[(&str, &str)] = &[
    ("", "None"),
    ("charge", "Charging"),
    ("evac", "Emptying"),
    ("hmMidMsn", "Recharging"),
    ("hmPostMsn", "End Mission"),
    ("hmUsrDock", "User Docking"),
    ("pause", "Paused"),
    ("run", "Running"),
    ("stop", "Stopped"),
    ("stuck", "Stuck"),
];

/// Phases in which the robot is heading to, or sitting on, its dock.
const DOCKING_PHASES: &[&str] = &["hmMidMsn", "hmPostMsn", "hmUsrDock"];

const NOT_READY_TEXT: &[(i64, &str)] = &[
    (0, "N/A"),
    (2, "Uneven Ground"),
    (15, "Low Battery"),
    (39, "Pending"),
    (48, "Path Blocked"),
];

/// `notReady` code the robot uses for a depleted battery.
const NOT_READY_LOW_BATTERY: i64 = 15;

const ERROR_TEXT: &[(i64, &str)] = &[
    (0, "None"),
    (1, "Left wheel off floor"),
    (2, "Main brushes stuck"),
    (3, "Right wheel off floor"),
    (4, "Left wheel stuck"),
    (5, "Right wheel stuck"),
    (6, "Stuck near a cliff"),
    (7, "Left wheel error"),
    (8, "Bin error"),
    (9, "Bumper stuck"),
    (10, "Right wheel error"),
    (11, "Bin error"),
    (12, "Cliff sensor issue"),
    (13, "Both wheels off floor"),
    (14, "Bin missing"),
    (15, "Reboot required"),
    (16, "Bumped unexpectedly"),
    (17, "Path blocked"),
    (18, "Docking issue"),
    (19, "Undocking issue"),
    (20, "Docking issue"),
    (21, "Navigation problem"),
    (22, "Navigation problem"),
    (23, "Battery issue"),
    (24, "Navigation problem"),
    (25, "Reboot required"),
    (26, "Vacuum problem"),
    (27, "Vacuum problem"),
    (29, "Software update needed"),
    (30, "Vacuum problem"),
    (31, "Reboot required"),
    (32, "Smart map problem"),
    (33, "Path blocked"),
    (34, "Reboot required"),
    (35, "Unrecognised cleaning pad"),
    (36, "Bin full"),
    (37, "Tank needed refilling"),
    (38, "Vacuum problem"),
    (39, "Reboot required"),
    (40, "Navigation problem"),
    (41, "Timed out"),
    (42, "Localization problem"),
    (43, "Navigation problem"),
    (44, "Pump issue"),
    (45, "Lid open"),
    (46, "Low battery"),
    (47, "Reboot required"),
    (48, "Path blocked"),
    (52, "Pad required attention"),
    (53, "Software update required"),
    (65, "Hardware problem detected"),
    (66, "Low memory"),
    (68, "Hardware problem detected"),
    (73, "Pad type changed"),
    (74, "Max area reached"),
    (75, "Navigation problem"),
    (76, "Hardware problem detected"),
    (88, "Back-up refused"),
    (89, "Mission runtime too long"),
    (101, "Battery isn't connected"),
    (102, "Charging error"),
    (103, "Charging error"),
    (104, "No charge current"),
    (105, "Charging current too low"),
    (106, "Battery too warm"),
    (107, "Battery temperature incorrect"),
    (108, "Battery communication failure"),
    (109, "Battery error"),
    (110, "Battery cell imbalance"),
    (111, "Battery communication failure"),
    (112, "Invalid charging load"),
    (114, "Internal battery failure"),
    (115, "Cell failure during charging"),
    (116, "Charging error of Home Base"),
    (118, "Battery communication failure"),
    (119, "Charging timeout"),
    (120, "Battery not initialized"),
    (122, "Charging system error"),
    (123, "Battery not initialized"),
];

fn lookup<V: Copy>(table: &[(&str, V)], key: &str) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn lookup_code(table: &[(i64, &'static str)], code: i64) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == code).map(|(_, v)| *v)
}

// ---------------------------------------------------------------------------
// Interpretation
// ---------------------------------------------------------------------------

/// Why the robot refuses to start.  Code 0 means "nothing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotReady {
    pub code: i64,
    pub text: String,
}

/// Robot-reported fault from `cleanMissionStatus.error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFault {
    pub code: i64,
    pub message: String,
}

/// Everything the interpreter derives from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub state: LifecycleState,
    pub phase: Option<String>,
    pub cycle: Option<String>,
    pub status: String,
    pub not_ready: NotReady,
    /// `None` when the robot reports error code 0.
    pub fault: Option<DeviceFault>,
}

/// Stateless mapper from telemetry to [`LifecycleState`] and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInterpreter {
    low_battery_pct: u8,
    low_tank_pct: u8,
}

impl Default for StateInterpreter {
    fn default() -> Self {
        Self {
            low_battery_pct: 10,
            low_tank_pct: 10,
        }
    }
}

impl StateInterpreter {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            low_battery_pct: config.low_battery_pct,
            low_tank_pct: config.low_tank_pct,
        }
    }

    /// Lifecycle state only.
    pub fn state(&self, snapshot: &TelemetrySnapshot) -> LifecycleState {
        let phase = snapshot.str_at("cleanMissionStatus.phase");
        let cycle = snapshot.str_at("cleanMissionStatus.cycle");
        let Some(mapped) = phase.and_then(|p| lookup(PHASE_STATES, p)) else {
            return LifecycleState::Error;
        };
        match mapped {
            LifecycleState::Idle | LifecycleState::Docked if cycle != Some("none") => {
                LifecycleState::Paused
            }
            other => other,
        }
    }

    /// Full interpretation: state, status text, not-ready reason and fault.
    pub fn interpret(&self, snapshot: &TelemetrySnapshot) -> Interpretation {
        let phase = snapshot.str_at("cleanMissionStatus.phase");
        let not_ready = not_ready(snapshot);
        let fault = match snapshot.i64_at("cleanMissionStatus.error").unwrap_or(0) {
            0 => None,
            code => Some(DeviceFault {
                code,
                message: error_message(code),
            }),
        };
        Interpretation {
            state: self.state(snapshot),
            phase: phase.map(str::to_owned),
            cycle: snapshot
                .str_at("cleanMissionStatus.cycle")
                .map(str::to_owned),
            status: self.status(snapshot, phase, not_ready.code),
            not_ready,
            fault,
        }
    }

    fn status(&self, snapshot: &TelemetrySnapshot, phase: Option<&str>, not_ready: i64) -> String {
        let Some(phase) = phase else {
            return "Unknown".to_owned();
        };
        let base = lookup(PHASE_STATUS, phase).unwrap_or("Unknown");
        if !DOCKING_PHASES.contains(&phase) {
            return base.to_owned();
        }

        let bin_full = snapshot.bool_at("bin.full").unwrap_or(false);
        let tank_low = snapshot
            .i64_at("tankLvl")
            .is_some_and(|lvl| lvl <= i64::from(self.low_tank_pct));
        let battery_low = snapshot
            .i64_at("batPct")
            .is_some_and(|pct| pct <= i64::from(self.low_battery_pct))
            || not_ready == NOT_READY_LOW_BATTERY;

        if bin_full {
            "Bin Full".to_owned()
        } else if tank_low {
            "Tank Low".to_owned()
        } else if battery_low {
            "Battery Low".to_owned()
        } else {
            base.to_owned()
        }
    }
}

fn not_ready(snapshot: &TelemetrySnapshot) -> NotReady {
    let code = snapshot.i64_at("cleanMissionStatus.notReady").unwrap_or(0);
    let text = lookup_code(NOT_READY_TEXT, code)
        .map_or_else(|| format!("Unknown message type {code}"), str::to_owned);
    NotReady { code, text }
}

/// Human-readable text for a robot error code.
pub fn error_message(code: i64) -> String {
    lookup_code(ERROR_TEXT, code).map_or_else(|| format!("Unknown error {code}"), str::to_owned)
}
