//! Session configuration parameters
//!
//! Everything the caller supplies when a robot session is set up.
//! Parsing the values out of a file or UI is the caller's job; this module
//! only holds them, provides defaults and validates ranges.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unit system used for the area figures handed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn is_metric(self) -> bool {
        self == Self::Metric
    }
}

/// Opaque robot password.  Never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for the transport adapter only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Core session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // --- Device ---
    /// Robot network address (IP or hostname)
    pub address: String,
    /// Robot identifier (BLID)
    pub blid: String,
    /// Robot password
    pub password: Password,

    // --- Transport behaviour (passed through to the transport) ---
    /// Keep the transport connection open instead of reconnecting per poll
    pub continuous: bool,
    /// Transport poll delay (seconds), used when not continuous
    pub delay_secs: u32,

    // --- Presentation ---
    /// Unit system for area figures
    pub unit_system: UnitSystem,
    /// Battery percentage at or below which docking status reads "Battery Low"
    pub low_battery_pct: u8,
    /// Tank level percentage at or below which docking status reads "Tank Low"
    pub low_tank_pct: u8,

    // --- Timing ---
    /// Upper bound for a whole connect attempt (milliseconds)
    pub connect_timeout_ms: u32,
    /// Upper bound for a disconnect (milliseconds)
    pub disconnect_timeout_ms: u32,
    /// Cadence of the connect and dock wait loops (milliseconds)
    pub poll_interval_ms: u32,
    /// How many poll intervals return-to-base waits for the pause to land
    pub dock_wait_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // Device
            address: String::new(),
            blid: String::new(),
            password: Password::default(),

            // Transport
            continuous: true,
            delay_secs: 1,

            // Presentation
            unit_system: UnitSystem::Metric,
            low_battery_pct: 10,
            low_tank_pct: 10,

            // Timing
            connect_timeout_ms: 10_000,   // 10 s
            disconnect_timeout_ms: 3_000, // 3 s
            poll_interval_ms: 1_000,      // 1 Hz
            dock_wait_attempts: 10,       // 10 s at 1 Hz
        }
    }
}

impl SessionConfig {
    /// Build a config for one robot with every other value defaulted.
    pub fn new(address: impl Into<String>, blid: impl Into<String>, password: Password) -> Self {
        Self {
            address: address.into(),
            blid: blid.into(),
            password,
            ..Self::default()
        }
    }

    /// Reject values the session cannot work with.  Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::Config("address must not be empty"));
        }
        if self.blid.trim().is_empty() {
            return Err(Error::Config("blid must not be empty"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config("connect_timeout_ms must be > 0"));
        }
        if self.disconnect_timeout_ms == 0 {
            return Err(Error::Config("disconnect_timeout_ms must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be > 0"));
        }
        if self.poll_interval_ms > self.connect_timeout_ms {
            return Err(Error::Config("poll_interval_ms must not exceed connect_timeout_ms"));
        }
        if self.low_battery_pct > 100 || self.low_tank_pct > 100 {
            return Err(Error::Config("percentage thresholds must be <= 100"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.connect_timeout_ms))
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.disconnect_timeout_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    /// Unique identifier used by presentation collaborators.
    pub fn unique_id(&self) -> String {
        format!("roomba_{}", self.blid)
    }
}
