//! Telemetry events accepted by the nozzle.
//!
//! On the wire (one JSON object per line):
//!
//! ```text
//! {"origin":"router","timestamp":1700000000000000000,"type":"counter","name":"requests_total","total":42}
//! {"origin":"router","timestamp":1700000000000000000,"type":"value","name":"latency_ms","value":3.5}
//! {"origin":"rep","timestamp":1700000000000000000,"type":"container","application_id":"abc","instance_index":0,
//!  "cpu_percentage":1.5,"memory_bytes":1024,"disk_bytes":2048}
//! ```

use serde::{Deserialize, Serialize};

/// An event plus the fields every event carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Component that emitted the event
    pub origin: String,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Monotonic counter; `total` is the cumulative value
    Counter { name: String, total: u64 },
    /// Point-in-time measurement
    Value { name: String, value: f64 },
    /// Resource usage of one application instance
    Container {
        application_id: String,
        instance_index: i32,
        cpu_percentage: f64,
        memory_bytes: u64,
        disk_bytes: u64,
    },
}

impl Envelope {
    pub fn new(origin: impl Into<String>, timestamp: i64, event: Event) -> Self {
        Self {
            origin: origin.into(),
            timestamp,
            event,
        }
    }
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Counter { .. } => "counter",
            Event::Value { .. } => "value",
            Event::Container { .. } => "container",
        }
    }
}
