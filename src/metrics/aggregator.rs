//! Last-write-wins aggregation of metric samples.
//!
//! The table keeps one sample per identity (prefixed canonical name plus tag
//! string). Newer samples overwrite older ones until the next flush swaps the
//! table out.
//!
//! `MetricAggregator` has no internal locking. Share it as a
//! [`SharedAggregator`] so that ingestion and the flush swap are serialized by
//! the same mutex.

use crate::core::Sample;
use crate::metrics::rename::RenameCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity -> latest sample
pub type AggregationTable = HashMap<String, Sample>;

/// Aggregator shared between the ingestion path and the flush scheduler.
pub type SharedAggregator = Arc<Mutex<MetricAggregator>>;

/// Name of the self-observability metric injected on every flush.
pub const SAMPLES_METRIC: &str = "samples";

#[derive(Debug)]
pub struct MetricAggregator {
    /// Prefix prepended to canonical names, without the trailing `.`
    prefix: String,
    renames: Arc<RenameCache>,
    table: AggregationTable,
    /// Samples ingested since the last flush
    ingested: u64,
}

impl MetricAggregator {
    /// Create an aggregator with its own rename cache.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_renames(prefix, Arc::new(RenameCache::new()))
    }

    /// Create an aggregator that shares an existing rename cache.
    pub fn with_renames(prefix: impl Into<String>, renames: Arc<RenameCache>) -> Self {
        Self {
            prefix: prefix.into(),
            renames,
            table: AggregationTable::new(),
            ingested: 0,
        }
    }

    /// Wrap into the mutex-guarded form used across tasks.
    pub fn shared(self) -> SharedAggregator {
        Arc::new(Mutex::new(self))
    }

    /// Identity key for a raw metric name and tag string.
    pub fn identity(&self, raw_name: &str, tags: &str) -> String {
        let name = self.renames.resolve(raw_name);
        if self.prefix.is_empty() {
            format!("{} {}", name, tags)
        } else {
            format!("{}.{} {}", self.prefix, name, tags)
        }
    }

    /// Record a sample, replacing whatever the table held for its identity.
    pub fn ingest(&mut self, raw_name: &str, tags: &str, timestamp: i64, value: f64) {
        let identity = self.identity(raw_name, tags);
        self.ingested += 1;
        self.table.insert(identity, Sample::new(timestamp, value));
    }

    /// Drop every entry. The ingestion counter is left alone.
    pub fn reset(&mut self) {
        self.table = AggregationTable::new();
    }

    /// Samples ingested since the last flush.
    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    pub fn get(&self, identity: &str) -> Option<&Sample> {
        self.table.get(identity)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn renames(&self) -> &Arc<RenameCache> {
        &self.renames
    }

    /// Inject the `samples` metric, hand back the frozen table, and start a
    /// new interval with an empty table and a zeroed counter.
    ///
    /// The caller holds the aggregator's lock for the whole call, so no sample
    /// can land between the injection and the swap.
    pub fn snapshot_and_reset(&mut self, samples_tags: &str, now: i64) -> AggregationTable {
        #[allow(clippy::cast_precision_loss)]
        let count = self.ingested as f64;
        self.ingest(SAMPLES_METRIC, samples_tags, now, count);
        self.ingested = 0;
        std::mem::take(&mut self.table)
    }
}
