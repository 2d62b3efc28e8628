//! Configuration management for bolo.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by the CLI)
//! - Validation and defaults

use crate::core::{BoloError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration for bolo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote engine connection settings
    pub engine: EngineConfig,
    /// Metrics nozzle settings
    pub nozzle: NozzleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Remote engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `host:port` of the engine's query/submission listener
    pub endpoint: String,
    /// Upper bound on establishing a TCP connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Upper bound on each write and on reading a full reply
    #[serde(with = "humantime_serde")]
    pub io_timeout: Duration,
}

/// Metrics nozzle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NozzleConfig {
    /// Prefix prepended (with a `.`) to every canonical metric name
    pub prefix: String,
    /// Base tags attached to every sample, joined with `,`
    pub tags: Vec<String>,
    /// Events from this origin are our own relay and are dropped
    pub relay_origin: String,
    /// How often the aggregation table is flushed
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets, thread ids and line numbers
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-line wire detail
    Trace,
    /// Debug information
    Debug,
    /// Lifecycle events
    Info,
    /// Dropped or skipped data
    Warn,
    /// Failures only
    Error,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            endpoint: "127.0.0.1:2001".to_string(),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for NozzleConfig {
    fn default() -> Self {
        NozzleConfig {
            prefix: "cf".to_string(),
            tags: Vec::new(),
            relay_origin: "MetronAgent".to_string(),
            flush_interval: Duration::from_secs(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.endpoint.trim().is_empty() {
            return Err(BoloError::config("missing engine endpoint"));
        }

        if !self.engine.endpoint.contains(':') {
            return Err(BoloError::config(format!(
                "engine endpoint must be host:port, got '{}'",
                self.engine.endpoint
            )));
        }

        if self.engine.connect_timeout.is_zero() {
            return Err(BoloError::config("connect_timeout must be greater than 0"));
        }

        if self.engine.io_timeout.is_zero() {
            return Err(BoloError::config("io_timeout must be greater than 0"));
        }

        if self.nozzle.flush_interval.is_zero() {
            return Err(BoloError::config("flush_interval must be greater than 0"));
        }

        // Tags become part of a space-delimited submission line.
        for tag in &self.nozzle.tags {
            if tag.contains(char::is_whitespace) {
                return Err(BoloError::config(format!(
                    "tag '{}' must not contain whitespace",
                    tag
                )));
            }
        }

        if self.nozzle.prefix.contains(char::is_whitespace) {
            return Err(BoloError::config("metric prefix must not contain whitespace"));
        }

        Ok(())
    }
}

impl NozzleConfig {
    /// Base tag string attached to every sample.
    pub fn base_tags(&self) -> String {
        if self.tags.is_empty() {
            "cf=unknown".to_string()
        } else {
            self.tags.join(",")
        }
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| BoloError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the engine endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.engine.endpoint = endpoint.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.engine.connect_timeout = timeout;
        self
    }

    /// Set the read/write timeout
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.engine.io_timeout = timeout;
        self
    }

    /// Replace the nozzle base tags
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.config.nozzle.tags = tags;
        self
    }

    /// Set the flush interval
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.nozzle.flush_interval = interval;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
