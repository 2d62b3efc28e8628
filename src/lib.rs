//! bolo - client core for the bolo time-series engine.
//!
//! Two pieces share one concern, moving time-series data over the engine's
//! text protocol:
//!
//! - **Query client**: plan and query requests over a short-lived TCP
//!   connection, with a decoder that rejects corrupt replies as a whole.
//! - **Metrics nozzle**: turns telemetry events into a last-write-wins table
//!   of samples and periodically flushes it to the engine.
//!
//! # Architecture
//!
//! - `wire`: request encoding and reply decoding
//! - `client`: plan/query client and the connection primitive
//! - `metrics`: rename cache and aggregation table
//! - `flush`: periodic snapshot delivery
//! - `nozzle`: event ingestion
//! - `core`: configuration, errors, shared types
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use bolo_lib::client::BoloClient;
//! use bolo_lib::core::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BoloClient::new(EngineConfig::default());
//!     let series = client.query("select cpu").await?;
//!     println!("{} series", series.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod client;
pub mod core;
pub mod flush;
pub mod metrics;
pub mod nozzle;
pub mod wire;

// Re-export core types for convenience
pub use crate::core::{BoloError, Config, Result};
