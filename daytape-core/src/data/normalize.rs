//! Day payload normalization.
//!
//! Accepts either a bare array of raw records or an object wrapping the array
//! under `day`. Structural problems degrade to an empty day instead of an error.

use crate::domain::{DayRecord, RawDayRecord};
use serde_json::Value;

/// Field name under which per-day documents may wrap their record array.
pub const DAY_WRAPPER_FIELD: &str = "day";

/// Normalize a raw day payload into the fixed record schema.
///
/// Non-object elements are skipped. Never fails.
pub fn normalize_day(raw: &Value) -> Vec<DayRecord> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get(DAY_WRAPPER_FIELD) {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| item.as_object())
        .map(|obj| RawDayRecord::new(obj).normalize())
        .collect()
}

/// Parse and normalize a per-day document from bytes.
pub fn normalize_day_bytes(bytes: &[u8]) -> Result<Vec<DayRecord>, serde_json::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(normalize_day(&value))
}
