//! Domain types shared by the query client and the nozzle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nanoseconds per second, used when truncating sample timestamps for the wire.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// One point of a series returned by the engine.
///
/// `value` is `None` when the engine reported `NaN`, i.e. no data for that slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Timestamp as reported by the engine
    #[serde(rename = "t")]
    pub timestamp: u64,
    /// Value, absent when the engine had nothing for this timestamp
    #[serde(rename = "v")]
    pub value: Option<f64>,
}

impl Measurement {
    /// Build a measurement from an already-decoded value.
    pub fn new(timestamp: u64, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    /// Build a measurement from a raw engine value, mapping `NaN` to absent.
    pub fn from_raw(timestamp: u64, raw: f64) -> Self {
        let value = if raw.is_nan() { None } else { Some(raw) };
        Self { timestamp, value }
    }
}

/// Measurements for one metric key, in the order the engine sent them.
pub type Series = Vec<Measurement>;

/// Query result: metric key to its series.
pub type SeriesMap = HashMap<String, Series>;

/// Latest observation for one aggregation identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    /// Last value ingested
    pub value: f64,
}

impl Sample {
    /// Build a sample.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp truncated to whole seconds, as written on the wire.
    pub fn unix_seconds(&self) -> i64 {
        self.timestamp / NANOS_PER_SEC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_becomes_absent() {
        let m = Measurement::from_raw(12, f64::NAN);
        assert_eq!(m.timestamp, 12);
        assert_eq!(m.value, None);

        let m = Measurement::from_raw(12, 0.0);
        assert_eq!(m.value, Some(0.0));
    }

    #[test]
    fn test_measurement_json_shape() {
        let series = vec![Measurement::new(1, Some(2.5)), Measurement::new(2, None)];
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"[{"t":1,"v":2.5},{"t":2,"v":null}]"#);
    }

    #[test]
    fn test_unix_seconds_truncates() {
        let sample = Sample::new(1_999_999_999, 1.0);
        assert_eq!(sample.unix_seconds(), 1);

        let sample = Sample::new(1000 * NANOS_PER_SEC, 1.0);
        assert_eq!(sample.unix_seconds(), 1000);
    }
}
