//! Flat diagnostic attribute map for presentation layers.
//!
//! Keys match what dashboards built against the robot already expect
//! (`total_cleaning_time`, `pmap_0`, `not_ready_code`, ...).  Optional keys
//! are left out entirely rather than rendered as null.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::interpreter::{Interpretation, LifecycleState};
use crate::statistics::StatisticsSnapshot;
use crate::telemetry::TelemetrySnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAttributes {
    pub software_version: Option<String>,
    pub status: String,
    /// JSON text of the robot's `lastCommand` (`""` encoded when absent).
    pub last_command: String,
    /// `pmap_0`, `pmap_1`, ... → map id.
    #[serde(flatten)]
    pub maps: Map<String, Value>,
    pub total_cleaning_time: i64,
    pub total_cleaned_area: i64,
    pub total_jobs: i64,
    pub total_dirt_events: i64,
    pub total_evacs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_area: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_ready: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_ready_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl StateAttributes {
    pub fn build(
        snapshot: &TelemetrySnapshot,
        interpretation: &Interpretation,
        statistics: &StatisticsSnapshot,
    ) -> Self {
        let job = statistics
            .current_job
            .as_ref()
            .filter(|_| interpretation.state == LifecycleState::Cleaning);
        let totals = &statistics.totals;

        Self {
            software_version: snapshot.str_at("softwareVer").map(str::to_owned),
            status: interpretation.status.clone(),
            last_command: last_command(snapshot),
            maps: map_ids(snapshot),
            total_cleaning_time: totals.cleaning_time,
            total_cleaned_area: totals.cleaned_area,
            total_jobs: totals.jobs,
            total_dirt_events: totals.dirt_events,
            total_evacs: totals.evacs,
            cleaning_time: job.map(|j| j.cleaning_time),
            cleaned_area: job.map(|j| j.cleaned_area),
            initiator: job.map(|j| j.initiator.clone()),
            error: interpretation.fault.as_ref().map(|f| f.message.clone()),
            error_code: interpretation.fault.as_ref().map(|f| f.code),
            not_ready: (interpretation.not_ready.code != 0)
                .then(|| interpretation.not_ready.text.clone()),
            not_ready_code: (interpretation.not_ready.code != 0)
                .then_some(interpretation.not_ready.code),
            position: position(snapshot),
        }
    }

    /// The attributes as one flat JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn last_command(snapshot: &TelemetrySnapshot) -> String {
    let value = snapshot
        .get("lastCommand")
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()));
    value.to_string()
}

/// Each `pmaps` entry is `{<map id>: <version>}`; the last key of each wins.
fn map_ids(snapshot: &TelemetrySnapshot) -> Map<String, Value> {
    let mut maps = Map::new();
    let Some(pmaps) = snapshot.get("pmaps").and_then(Value::as_array) else {
        return maps;
    };
    for (n, entry) in pmaps.iter().enumerate() {
        if let Some(id) = entry.as_object().and_then(|m| m.keys().last()) {
            maps.insert(format!("pmap_{n}"), Value::String(id.clone()));
        }
    }
    maps
}

fn position(snapshot: &TelemetrySnapshot) -> Option<String> {
    if snapshot.i64_at("cap.pose") != Some(1) {
        return None;
    }
    let coords = (
        snapshot.get("pose.point.x"),
        snapshot.get("pose.point.y"),
        snapshot.get("pose.theta"),
    );
    Some(match coords {
        (Some(x), Some(y), Some(theta)) if !x.is_null() && !y.is_null() && !theta.is_null() => {
            format!("({x}, {y}, {theta})")
        }
        _ => "(0,0,0)".to_owned(),
    })
}
