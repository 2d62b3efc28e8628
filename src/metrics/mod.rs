//! In-memory metric aggregation for the nozzle.
//!
//! - `rename`: canonical metric names with a process-lifetime cache
//! - `aggregator`: last-write-wins table keyed by metric identity

pub mod aggregator;
pub mod rename;

pub use aggregator::{AggregationTable, MetricAggregator, SharedAggregator, SAMPLES_METRIC};
pub use rename::{canonicalize, RenameCache};
