//! Telemetry store: the latest known robot-reported state.
//!
//! The transport pushes partial reports at whatever rate the robot sends
//! them.  Each report is merged recursively into the current state and the
//! result is published as a fresh immutable [`TelemetrySnapshot`]:
//!
//! ```text
//!  partial ──▶ merge(current.clone(), partial) ──▶ Arc swap ──▶ readers
//!                      (unlocked)                 (locked)
//! ```
//!
//! Readers hold an `Arc` to whichever snapshot was current when they asked,
//! so they never observe a half-merged report.  A key that an update does
//! not mention keeps its previous value.

pub mod feed;
pub mod path;

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::trace;
use serde_json::{Map, Value};

pub use feed::{NotificationFilter, TelemetryFeed, TouchedKeys};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable view of everything the robot has reported so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    reported: Map<String, Value>,
    revision: u64,
}

impl TelemetrySnapshot {
    /// Build a snapshot directly from a reported object (revision 0).
    pub fn from_reported(reported: Map<String, Value>) -> Self {
        Self {
            reported,
            revision: 0,
        }
    }

    /// Build a snapshot from a JSON value; non-objects yield an empty snapshot.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(reported) => Self::from_reported(reported),
            _ => Self::default(),
        }
    }

    pub fn reported(&self) -> &Map<String, Value> {
        &self.reported
    }

    /// Number of merges that produced this snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        path::resolve(&self.reported, path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn i64_at(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(path::as_i64)
    }

    pub fn f64_at(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(path::as_f64)
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(path::as_bool)
    }

    /// The robot's name, once it has reported a non-empty one.
    pub fn identity_name(&self) -> Option<&str> {
        self.str_at("name").filter(|name| !name.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Recursively merge `partial` into `target`.
///
/// Objects merge key by key; every other value (including arrays and
/// explicit `null`) replaces what was there.
pub fn merge_into(target: &mut Map<String, Value>, partial: &Map<String, Value>) {
    for (key, incoming) in partial {
        if let (Some(Value::Object(existing)), Value::Object(update)) = (target.get_mut(key), incoming) {
            merge_into(existing, update);
            continue;
        }
        target.insert(key.clone(), incoming.clone());
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Single-writer / many-reader holder of the current snapshot.
pub struct TelemetryStore {
    current: BlockingMutex<CriticalSectionRawMutex, RefCell<Arc<TelemetrySnapshot>>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self {
            current: BlockingMutex::new(RefCell::new(Arc::new(TelemetrySnapshot::default()))),
        }
    }

    /// Merge a partial report and publish the result as the new snapshot.
    ///
    /// The lock is held only to read and to swap the current `Arc`; the
    /// clone and merge run outside it.  If another update lands in between,
    /// the merge is redone on top of it.
    pub fn update(&self, partial: &Map<String, Value>) -> Arc<TelemetrySnapshot> {
        self.update_with(partial, merge_into)
    }

    fn update_with(
        &self,
        partial: &Map<String, Value>,
        merge: impl Fn(&mut Map<String, Value>, &Map<String, Value>),
    ) -> Arc<TelemetrySnapshot> {
        loop {
            let base = self.snapshot();
            let mut reported = base.reported.clone();
            merge(&mut reported, partial);
            let next = Arc::new(TelemetrySnapshot {
                reported,
                revision: base.revision.wrapping_add(1),
            });
            let swapped = self.current.lock(|cell| {
                let mut current = cell.borrow_mut();
                if !Arc::ptr_eq(&*current, &base) {
                    return false;
                }
                *current = Arc::clone(&next);
                true
            });
            if swapped {
                trace!("telemetry revision {} ({} keys merged)", next.revision, partial.len());
                return next;
            }
            trace!("telemetry revision {} superseded, re-merging", next.revision);
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.current.lock(|cell| Arc::clone(&cell.borrow()))
    }
}
