//! Command-line interface for bolo.
//!
//! `bolo plan` and `bolo query` talk to the engine directly; `bolo nozzle`
//! reads telemetry events from stdin and ships aggregated samples.

use crate::client::BoloClient;
use crate::core::{BoloError, Config, ConfigBuilder, Result};
use crate::flush::FlushScheduler;
use crate::metrics::MetricAggregator;
use crate::nozzle::Nozzle;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Client for the bolo time-series engine
#[derive(Parser, Debug)]
#[command(name = "bolo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/bolo/config.yaml)
    #[arg(short, long, env = "BOLO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Engine endpoint as host:port
    #[arg(short, long, env = "BOLO_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "BOLO_DEBUG", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show which fields a query would select
    Plan {
        /// Query text, passed to the engine untouched
        query: String,
    },
    /// Run a query and print the series as JSON
    Query {
        /// Query text, passed to the engine untouched
        query: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Aggregate JSON events from stdin and flush them to the engine
    Nozzle {
        /// Base tags for every sample (comma separated)
        #[arg(short, long, env = "BOLO_TAGS", value_delimiter = ',')]
        tags: Vec<String>,
        /// Seconds between flushes
        #[arg(long)]
        flush_interval: Option<u64>,
    },
    /// Validate configuration and exit
    CheckConfig,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments and their environment variables (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("bolo").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/bolo/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
            },
            Err(e) if self.config.is_some() => {
                return Err(BoloError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {},
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }

        if let Command::Nozzle {
            tags,
            flush_interval,
        } = &self.command
        {
            if !tags.is_empty() {
                builder = builder.tags(tags.clone());
            }
            if let Some(secs) = flush_interval {
                builder = builder.flush_interval(Duration::from_secs(*secs));
            }
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let log_level = if self.debug {
            "debug".to_string()
        } else {
            std::env::var("BOLO_LOG_LEVEL")
                .unwrap_or_else(|_| config.logging.level.as_str().to_string())
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        // Logs go to stderr; stdout carries command output.
        let fmt_layer = if config.logging.structured {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .compact()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| BoloError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute a bolo command.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;
    cli.init_logging(&config)?;
    tracing::debug!(endpoint = %config.engine.endpoint, "configuration loaded");

    match &cli.command {
        Command::Plan { query } => {
            let client = BoloClient::new(config.engine.clone());
            for field in client.plan(query).await? {
                println!("{}", field);
            }
            Ok(())
        },
        Command::Query { query, pretty } => {
            let client = BoloClient::new(config.engine.clone());
            let series = client.query(query).await?;
            let json = if *pretty {
                serde_json::to_string_pretty(&series)?
            } else {
                serde_json::to_string(&series)?
            };
            println!("{}", json);
            Ok(())
        },
        Command::Nozzle { .. } => run_nozzle(config).await,
        Command::CheckConfig => {
            config.validate()?;
            println!("Configuration is valid!");
            println!("  Engine endpoint: {}", config.engine.endpoint);
            println!("  Connect timeout: {:?}", config.engine.connect_timeout);
            println!("  IO timeout: {:?}", config.engine.io_timeout);
            println!("  Base tags: {}", config.nozzle.base_tags());
            println!("  Flush interval: {:?}", config.nozzle.flush_interval);
            Ok(())
        },
    }
}

async fn run_nozzle(config: Config) -> Result<()> {
    let aggregator = MetricAggregator::new(config.nozzle.prefix.clone()).shared();
    let nozzle = Nozzle::new(Arc::clone(&aggregator), &config.nozzle);
    let scheduler = FlushScheduler::new(aggregator, config.engine.clone(), &config.nozzle);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let flusher = tokio::spawn(async move {
        scheduler
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    tracing::info!(
        endpoint = %config.engine.endpoint,
        tags = %config.nozzle.base_tags(),
        "nozzle reading events from stdin"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        stats = nozzle.consume(stdin) => stats.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping...");
            Ok(())
        }
    };

    let _ = stop_tx.send(());
    flusher.await?;
    result
}
