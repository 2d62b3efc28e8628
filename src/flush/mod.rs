//! Periodic delivery of the aggregation table to the engine.
//!
//! Each flush swaps the table out under the aggregator lock, then writes one
//! submission line per entry over a freshly opened connection. Delivery is
//! at-most-once: if the engine cannot be reached the interval's samples are
//! logged as dropped and never retried.

use crate::client::{connect, timed};
use crate::core::{EngineConfig, NozzleConfig, Result, NANOS_PER_SEC};
use crate::metrics::{AggregationTable, SharedAggregator};
use crate::wire::encode_sample_line;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::MissedTickBehavior;

/// What happened to one flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries taken from the table, including the `samples` metric
    pub entries: usize,
    /// Lines handed to the connection before it closed or failed. Lines
    /// still buffered when a failure hits are counted but never arrive.
    pub written: usize,
}

impl FlushReport {
    /// Entries that did not reach the engine.
    pub fn dropped(&self) -> usize {
        self.entries - self.written
    }
}

pub struct FlushScheduler {
    aggregator: SharedAggregator,
    engine: EngineConfig,
    /// Tags for the injected `samples` metric
    samples_tags: String,
    interval: Duration,
}

impl FlushScheduler {
    pub fn new(aggregator: SharedAggregator, engine: EngineConfig, nozzle: &NozzleConfig) -> Self {
        Self {
            aggregator,
            engine,
            samples_tags: format!("{},origin=scheduler", nozzle.base_tags()),
            interval: nozzle.flush_interval,
        }
    }

    /// Flush now, stamping the `samples` metric with the current second.
    pub async fn flush(&self) -> FlushReport {
        let now = chrono::Utc::now().timestamp().saturating_mul(NANOS_PER_SEC);
        self.flush_at(now).await
    }

    /// Flush now, stamping the `samples` metric with `now` (nanoseconds).
    pub async fn flush_at(&self, now: i64) -> FlushReport {
        let table = self.aggregator.lock().snapshot_and_reset(&self.samples_tags, now);
        let entries = table.len();

        let mut written = 0;
        if let Err(e) = self.send(&table, &mut written).await {
            tracing::error!(
                endpoint = %self.engine.endpoint,
                entries,
                written,
                "flush failed, dropping samples: {}",
                e
            );
        }

        let report = FlushReport { entries, written };
        tracing::debug!(
            endpoint = %self.engine.endpoint,
            entries = report.entries,
            written = report.written,
            "flush complete"
        );
        report
    }

    /// Write `table` over a new connection, counting lines into `written`
    /// as they are accepted so a failure still reports partial progress.
    async fn send(&self, table: &AggregationTable, written: &mut usize) -> Result<()> {
        let stream = connect(&self.engine).await?;
        let mut writer = BufWriter::new(stream);
        let limit = self.engine.io_timeout;

        for (identity, sample) in table {
            let line = encode_sample_line(identity, sample);
            timed(limit, "write sample", writer.write_all(line.as_bytes())).await?;
            *written += 1;
        }
        timed(limit, "flush samples", writer.flush()).await?;
        timed(limit, "close connection", writer.shutdown()).await?;
        Ok(())
    }

    /// Flush every interval until `shutdown` resolves, then flush once more.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::info!(
            endpoint = %self.engine.endpoint,
            interval = ?self.interval,
            "flush scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                () = &mut shutdown => {
                    tracing::info!("flush scheduler stopping, final flush");
                    self.flush().await;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricAggregator;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn stub_engine() -> (EngineConfig, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut body = String::new();
            stream.read_to_string(&mut body).await.unwrap();
            let mut lines: Vec<String> = body.lines().map(str::to_string).collect();
            lines.sort();
            lines
        });

        let engine = EngineConfig {
            endpoint: addr.to_string(),
            connect_timeout: Duration::from_secs(2),
            io_timeout: Duration::from_secs(2),
        };
        (engine, handle)
    }

    #[tokio::test]
    async fn test_flush_writes_table_and_samples() {
        let (engine, handle) = stub_engine().await;
        let aggregator = MetricAggregator::new("cf").shared();
        aggregator
            .lock()
            .ingest("cpu_used", "host=a", 1000 * NANOS_PER_SEC, 42.5);

        let scheduler = FlushScheduler::new(aggregator.clone(), engine, &NozzleConfig::default());
        let report = scheduler.flush_at(5000 * NANOS_PER_SEC).await;

        assert_eq!(report, FlushReport { entries: 2, written: 2 });
        assert_eq!(
            handle.await.unwrap(),
            vec![
                "cf.cpu-used host=a 1000 42.500000".to_string(),
                "cf.samples cf=unknown,origin=scheduler 5000 1.000000".to_string(),
            ]
        );
        assert!(aggregator.lock().is_empty());
        assert_eq!(aggregator.lock().ingested(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_engine_drops_interval() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let aggregator = MetricAggregator::new("cf").shared();
        aggregator.lock().ingest("cpu", "host=a", 1, 1.0);

        let engine = EngineConfig {
            endpoint: addr.to_string(),
            ..EngineConfig::default()
        };
        let scheduler = FlushScheduler::new(aggregator.clone(), engine, &NozzleConfig::default());
        let report = scheduler.flush_at(0).await;

        assert_eq!(report.entries, 2);
        assert_eq!(report.written, 0);
        assert_eq!(report.dropped(), 2);
        assert!(aggregator.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_engine_reports_partial_write() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let holder = tokio::spawn(async move {
            // Accept but never read, so the connection backs up.
            let (stream, _) = listener.accept().await.unwrap();
            let _ = release_rx.await;
            drop(stream);
        });

        let aggregator = MetricAggregator::new("cf").shared();
        {
            let mut agg = aggregator.lock();
            for i in 0..500_000 {
                agg.ingest(&format!("m{}", i), "host=stalled-engine", NANOS_PER_SEC, 1.0);
            }
        }

        let engine = EngineConfig {
            endpoint: addr.to_string(),
            connect_timeout: Duration::from_secs(2),
            io_timeout: Duration::from_millis(200),
        };
        let scheduler = FlushScheduler::new(aggregator.clone(), engine, &NozzleConfig::default());
        let report = scheduler.flush_at(NANOS_PER_SEC).await;
        release_tx.send(()).unwrap();
        holder.await.unwrap();

        assert_eq!(report.entries, 500_001);
        assert!(report.written > 0);
        assert!(report.written < report.entries);
        assert_eq!(report.dropped(), report.entries - report.written);
        assert!(aggregator.lock().is_empty());
    }

    #[tokio::test]
    async fn test_samples_count_restarts_after_flush() {
        let (engine, handle) = stub_engine().await;
        let aggregator = MetricAggregator::new("cf").shared();
        aggregator.lock().ingest("cpu", "host=a", 1, 1.0);
        aggregator.lock().snapshot_and_reset("cf=unknown,origin=scheduler", 0);
        aggregator.lock().ingest("cpu", "host=a", 2, 2.0);
        aggregator.lock().ingest("mem", "host=a", 2, 3.0);

        let scheduler = FlushScheduler::new(aggregator, engine, &NozzleConfig::default());
        scheduler.flush_at(0).await;

        let lines = handle.await.unwrap();
        assert!(lines.contains(&"cf.samples cf=unknown,origin=scheduler 0 2.000000".to_string()));
    }

    #[tokio::test]
    async fn test_run_until_flushes_on_shutdown() {
        let (engine, handle) = stub_engine().await;
        let aggregator = MetricAggregator::new("cf").shared();
        aggregator.lock().ingest("cpu", "host=a", 0, 7.0);

        let nozzle = NozzleConfig {
            flush_interval: Duration::from_secs(3600),
            ..NozzleConfig::default()
        };
        let scheduler = FlushScheduler::new(aggregator.clone(), engine, &nozzle);
        scheduler.run_until(async {}).await;

        let lines = handle.await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "cf.cpu host=a 0 7.000000");
        assert!(aggregator.lock().is_empty());
    }
}
