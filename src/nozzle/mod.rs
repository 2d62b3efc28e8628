//! Ingestion adapter: turns telemetry events into aggregator samples.
//!
//! Counter and value events become one sample tagged with the emitting
//! system. Container events fan out to `app.cpu`, `app.mem` and `app.disk`
//! tagged with the application id and instance index. Events from our own
//! relay are dropped before anything is ingested.

pub mod event;

pub use event::{Envelope, Event};

use crate::core::{NozzleConfig, Result};
use crate::metrics::SharedAggregator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Totals for one pass over an event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeStats {
    /// Events that reached the aggregator
    pub tracked: u64,
    /// Events dropped because they came from the relay
    pub relayed: u64,
    /// Lines that could not be decoded
    pub malformed: u64,
}

pub struct Nozzle {
    aggregator: SharedAggregator,
    base_tags: String,
    relay_origin: String,
}

impl Nozzle {
    pub fn new(aggregator: SharedAggregator, config: &NozzleConfig) -> Self {
        Self {
            aggregator,
            base_tags: config.base_tags(),
            relay_origin: config.relay_origin.clone(),
        }
    }

    /// True when an event came from the relay feeding us.
    pub fn is_relay(&self, origin: &str) -> bool {
        origin == self.relay_origin
    }

    /// Ingest one event. Returns false if it was filtered out.
    #[allow(clippy::cast_precision_loss)]
    pub fn track(&self, envelope: &Envelope) -> bool {
        if self.is_relay(&envelope.origin) {
            return false;
        }

        let ts = envelope.timestamp;
        let mut aggregator = self.aggregator.lock();
        match &envelope.event {
            Event::Counter { name, total } => {
                let tags = format!("{},sys={}", self.base_tags, envelope.origin);
                aggregator.ingest(name, &tags, ts, *total as f64);
            },
            Event::Value { name, value } => {
                let tags = format!("{},sys={}", self.base_tags, envelope.origin);
                aggregator.ingest(name, &tags, ts, *value);
            },
            Event::Container {
                application_id,
                instance_index,
                cpu_percentage,
                memory_bytes,
                disk_bytes,
            } => {
                let tags = format!(
                    "{},app={},idx={}",
                    self.base_tags, application_id, instance_index
                );
                aggregator.ingest("app.cpu", &tags, ts, *cpu_percentage);
                aggregator.ingest("app.mem", &tags, ts, *memory_bytes as f64);
                aggregator.ingest("app.disk", &tags, ts, *disk_bytes as f64);
            },
        }
        true
    }

    /// Read newline-delimited JSON events until EOF.
    ///
    /// Lines that are not valid UTF-8 or not a known event are logged and
    /// skipped; only read errors end the stream early.
    pub async fn consume<R>(&self, mut reader: R) -> Result<ConsumeStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ConsumeStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // serde_json ignores the surrounding whitespace and line ending.
            match serde_json::from_slice::<Envelope>(&buf) {
                Ok(envelope) => {
                    if self.track(&envelope) {
                        stats.tracked += 1;
                    } else {
                        stats.relayed += 1;
                    }
                },
                Err(e) => {
                    stats.malformed += 1;
                    tracing::warn!(
                        payload = %hex::encode(&buf[..buf.len().min(64)]),
                        "skipping undecodable event: {}",
                        e
                    );
                },
            }
        }

        tracing::info!(
            tracked = stats.tracked,
            relayed = stats.relayed,
            malformed = stats.malformed,
            "event stream ended"
        );
        Ok(stats)
    }
}
