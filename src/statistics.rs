//! Lifetime and current-job cleaning statistics.
//!
//! Recomputed from the snapshot on every read; nothing is cached.  The robot
//! reports areas in square feet, converted here when the session runs in
//! metric units.

use serde::Serialize;

use crate::config::UnitSystem;
use crate::interpreter::LifecycleState;
use crate::telemetry::TelemetrySnapshot;

/// Square feet → square metres.
pub const SQFT_TO_SQM: f64 = 0.0929;

/// Convert a robot-reported area (sqft) to the configured unit system.
///
/// Metric values are rounded half away from zero; imperial values pass
/// through unchanged.
pub fn convert_area(sqft: i64, units: UnitSystem) -> i64 {
    if units.is_metric() {
        (sqft as f64 * SQFT_TO_SQM).round() as i64
    } else {
        sqft
    }
}

/// All-time totals from the `bbrun` group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifetimeTotals {
    /// Minutes.
    pub cleaning_time: i64,
    pub cleaned_area: i64,
    pub jobs: i64,
    pub dirt_events: i64,
    pub evacs: i64,
}

/// Figures for the mission in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStatistics {
    /// Minutes.
    pub cleaning_time: i64,
    pub cleaned_area: i64,
    pub initiator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub totals: LifetimeTotals,
    /// Only present while the robot is cleaning.
    pub current_job: Option<JobStatistics>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsAggregator {
    units: UnitSystem,
}

impl StatisticsAggregator {
    pub fn new(units: UnitSystem) -> Self {
        Self { units }
    }

    pub fn lifetime(&self, snapshot: &TelemetrySnapshot) -> LifetimeTotals {
        let field = |key: &str| snapshot.i64_at(&format!("bbrun.{key}")).unwrap_or(0);
        LifetimeTotals {
            cleaning_time: field("hr").saturating_mul(60).saturating_add(field("min")),
            cleaned_area: convert_area(field("sqft"), self.units),
            jobs: field("nMssn"),
            dirt_events: field("nScrubs"),
            evacs: field("nEvacs"),
        }
    }

    /// Current-job figures, regardless of state.  `now` is epoch seconds.
    pub fn current_job(&self, snapshot: &TelemetrySnapshot, now: i64) -> JobStatistics {
        let cleaning_time = match snapshot.i64_at("cleanMissionStatus.mssnM") {
            Some(minutes) if minutes != 0 => minutes,
            _ => match snapshot.i64_at("cleanMissionStatus.mssnStrtTm") {
                Some(start) if now > start => now.saturating_sub(start) / 60,
                _ => 0,
            },
        };
        JobStatistics {
            cleaning_time,
            cleaned_area: convert_area(
                snapshot.i64_at("cleanMissionStatus.sqft").unwrap_or(0),
                self.units,
            ),
            initiator: snapshot
                .str_at("cleanMissionStatus.initiator")
                .unwrap_or_default()
                .to_owned(),
        }
    }

    /// Totals plus, while cleaning, the current job.
    pub fn aggregate(
        &self,
        snapshot: &TelemetrySnapshot,
        state: LifecycleState,
        now: i64,
    ) -> StatisticsSnapshot {
        StatisticsSnapshot {
            totals: self.lifetime(snapshot),
            current_job: (state == LifecycleState::Cleaning)
                .then(|| self.current_job(snapshot, now)),
        }
    }
}
