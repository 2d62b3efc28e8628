//! Core domain models, configuration and errors for bolo.

#![warn(missing_docs)]

/// Configuration loading and validation
pub mod config;
/// Error taxonomy and presentation policy
pub mod error;
/// Query results and aggregation samples
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, EngineConfig, LogLevel, NozzleConfig};
pub use error::{BoloError, Result, GENERIC_SERVER_ERROR};
pub use types::{Measurement, Sample, Series, SeriesMap, NANOS_PER_SEC};
