//! Fuzz target: `TelemetryFeed::ingest` + interpretation
//!
//! Splits the input on newlines, parses each line as a JSON telemetry
//! message and pushes it through the ingest path, then derives every
//! presentation view from the merged snapshot.  Verifies:
//! - No panics for any message shape (arrays, nulls, wrong types)
//! - The revision counts exactly the object messages ingested
//! - Current-job attributes appear only while cleaning
//!
//! cargo fuzz run fuzz_telemetry_ingest

#![no_main]

use libfuzzer_sys::fuzz_target;
use roombalink::attributes::StateAttributes;
use roombalink::config::UnitSystem;
use roombalink::device::{self, CleanBaseReading, RobotVariant};
use roombalink::interpreter::{LifecycleState, StateInterpreter};
use roombalink::statistics::StatisticsAggregator;
use roombalink::telemetry::TelemetryFeed;

fuzz_target!(|data: &[u8]| {
    let feed = TelemetryFeed::new();
    let mut ingested = 0u64;

    for line in data.split(|b| *b == b'\n') {
        let Ok(message) = serde_json::from_slice::<serde_json::Value>(line) else {
            continue;
        };
        if feed.ingest(&message).is_some() {
            ingested += 1;
        }
    }

    let snap = feed.store().snapshot();
    assert_eq!(snap.revision(), ingested, "one revision per object message");

    let interpreter = StateInterpreter::default();
    let interp = interpreter.interpret(&snap);
    assert_eq!(interp.state, interpreter.state(&snap));

    for units in [UnitSystem::Metric, UnitSystem::Imperial] {
        let stats = StatisticsAggregator::new(units).aggregate(&snap, interp.state, i64::from(u32::MAX));
        let attrs = StateAttributes::build(&snap, &interp, &stats).to_map();
        assert_eq!(
            attrs.contains_key("cleaning_time"),
            interp.state == LifecycleState::Cleaning
        );
    }

    let _ = RobotVariant::detect(&snap);
    let _ = CleanBaseReading::from_snapshot(&snap);
    let _ = device::bin_full(&snap);
});
