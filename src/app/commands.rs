//! Commands flowing into and out of the application core.
//!
//! [`AppCommand`] is what callers (automations, a UI, the simulator) ask
//! the [`RoombaService`](super::service::RoombaService) to do.  [`Command`]
//! is what actually goes over the wire to the robot through the
//! [`TransportPort`](super::ports::TransportPort).

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ───────────────────────────────────────────────────────────────
// Inbound (caller → service)
// ───────────────────────────────────────────────────────────────

/// High-level requests the service understands.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Start a mission, or resume it when paused.
    Start,
    Stop,
    Pause,
    /// Make the robot play its locator sound.
    Locate,
    /// Pause if cleaning, then send the robot home.
    ReturnToBase,
    /// Targeted clean of selected rooms/zones on a stored map.
    CleanRooms {
        map_id: Option<String>,
        regions: Vec<Region>,
    },
    /// Raw passthrough.
    Send {
        name: String,
        params: Option<Map<String, Value>>,
    },
}

// ───────────────────────────────────────────────────────────────
// Outbound (service → robot)
// ───────────────────────────────────────────────────────────────

/// Command names the robot accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandName {
    Start,
    Stop,
    Pause,
    Resume,
    Dock,
    Find,
    CleanRooms,
    /// Anything else, sent verbatim.
    Raw(String),
}

impl CommandName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Dock => "dock",
            Self::Find => "find",
            Self::CleanRooms => "clean_rooms",
            Self::Raw(name) => name,
        }
    }

    /// Map a wire name back to a known command; unknown names become `Raw`.
    pub fn parse(name: &str) -> Self {
        match name {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "dock" => Self::Dock,
            "find" => Self::Find,
            "clean_rooms" => Self::CleanRooms,
            other => Self::Raw(other.to_owned()),
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message for the robot.  Fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: CommandName,
    pub params: Option<Map<String, Value>>,
}

impl Command {
    pub fn new(name: CommandName) -> Self {
        Self { name, params: None }
    }

    pub fn with_params(name: CommandName, params: Map<String, Value>) -> Self {
        Self {
            name,
            params: Some(params),
        }
    }

    /// `clean_rooms` with `{regions: [...], pmap_id?: ...}`.
    pub fn clean_rooms(map_id: Option<&str>, regions: &[Region]) -> Self {
        let mut params = Map::new();
        params.insert(
            "regions".into(),
            Value::Array(regions.iter().map(Region::to_value).collect()),
        );
        if let Some(id) = map_id {
            params.insert("pmap_id".into(), Value::String(id.to_owned()));
        }
        Self::with_params(CommandName::CleanRooms, params)
    }

    /// Parameter object as sent on the wire (`{}` when there are none).
    pub fn payload(&self) -> Value {
        Value::Object(self.params.clone().unwrap_or_default())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(params) => write!(f, "{} {}", self.name, Value::Object(params.clone())),
            None => write!(f, "{}", self.name),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Regions
// ───────────────────────────────────────────────────────────────

/// Room (`rid`) or user-drawn zone (`zid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegionKind {
    #[default]
    #[serde(rename = "rid")]
    Room,
    #[serde(rename = "zid")]
    Zone,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "rid",
            Self::Zone => "zid",
        }
    }
}

/// A sub-area of a stored map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_id: String,
    #[serde(rename = "type", default)]
    pub kind: RegionKind,
}

impl Region {
    pub fn room(id: impl Into<String>) -> Self {
        Self {
            region_id: id.into(),
            kind: RegionKind::Room,
        }
    }

    pub fn zone(id: impl Into<String>) -> Self {
        Self {
            region_id: id.into(),
            kind: RegionKind::Zone,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({"region_id": self.region_id, "type": self.kind.as_str()})
    }
}
