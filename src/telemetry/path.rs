//! Dot-path lookups into reported telemetry.
//!
//! Robots report a loosely typed, partially populated JSON tree.  These
//! helpers resolve paths like `"cleanMissionStatus.phase"` and coerce the
//! leaf into the shape the caller wants, returning `None` instead of
//! failing when a value is absent or has the wrong type.

use serde_json::{Map, Value};

/// Resolve a dot-notation path inside a reported object.
///
/// ```
/// use roombalink::telemetry::path::resolve;
/// let reported = serde_json::json!({"bbrun": {"hr": 4}});
/// let map = reported.as_object().unwrap();
/// assert_eq!(resolve(map, "bbrun.hr"), Some(&serde_json::json!(4)));
/// ```
pub fn resolve<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(obj) => obj.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Integer view of a value.  Floats truncate, numeric strings parse.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float view of a value.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Boolean view of a value.  The robot uses both `true` and `1`.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}
