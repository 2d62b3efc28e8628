//! Query client for the bolo engine.
//!
//! Every call opens its own TCP connection, writes a single request, reads the
//! reply until the engine closes the stream, and drops the connection before
//! returning. There is no pooling, so calls share no state and may run
//! concurrently.

use crate::core::{BoloError, EngineConfig, Result, SeriesMap};
use crate::wire::{decode_plan_reply, decode_query_reply, encode_request, Verb};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Run an I/O future under a deadline, mapping both failure modes.
pub(crate) async fn timed<F, T>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(BoloError::transport(format!("{}: {}", what, e))),
        Err(_) => Err(BoloError::Timeout {
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Open a fresh connection to the engine, bounded by the connect timeout.
pub async fn connect(engine: &EngineConfig) -> Result<TcpStream> {
    let stream = timed(
        engine.connect_timeout,
        "connect",
        TcpStream::connect(engine.endpoint.as_str()),
    )
    .await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Client for plan and query requests.
#[derive(Debug, Clone)]
pub struct BoloClient {
    engine: EngineConfig,
}

impl BoloClient {
    /// Create a client for the given engine.
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    /// Address this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.engine.endpoint
    }

    /// Ask the engine which fields `query` would select, without running it.
    pub async fn plan(&self, query: &str) -> Result<Vec<String>> {
        let reply = self.round_trip(Verb::Plan, query).await?;
        decode_plan_reply(&reply).map_err(|e| self.report(Verb::Plan, e, &reply))
    }

    /// Run `query` and return every series the engine sent back.
    pub async fn query(&self, query: &str) -> Result<SeriesMap> {
        let reply = self.round_trip(Verb::Query, query).await?;
        decode_query_reply(&reply).map_err(|e| self.report(Verb::Query, e, &reply))
    }

    async fn round_trip(&self, verb: Verb, query: &str) -> Result<Vec<u8>> {
        let result = self.exchange(verb, query).await;
        if let Err(e) = &result {
            tracing::error!(
                endpoint = %self.engine.endpoint,
                verb = %verb.as_char(),
                category = e.category(),
                "request failed: {}",
                e
            );
        }
        result
    }

    async fn exchange(&self, verb: Verb, query: &str) -> Result<Vec<u8>> {
        let mut stream = connect(&self.engine).await?;
        let request = encode_request(verb, query);
        timed(self.engine.io_timeout, "write request", stream.write_all(&request)).await?;

        let mut reply = Vec::new();
        timed(self.engine.io_timeout, "read reply", stream.read_to_end(&mut reply)).await?;
        tracing::debug!(
            endpoint = %self.engine.endpoint,
            verb = %verb.as_char(),
            bytes = reply.len(),
            "reply received"
        );
        Ok(reply)
    }

    /// Log a decoding failure with enough of the reply to diagnose it.
    fn report(&self, verb: Verb, err: BoloError, reply: &[u8]) -> BoloError {
        match &err {
            BoloError::Remote(message) => {
                tracing::warn!(
                    endpoint = %self.engine.endpoint,
                    verb = %verb.as_char(),
                    "engine returned error: {}",
                    message
                );
            },
            _ => {
                tracing::error!(
                    endpoint = %self.engine.endpoint,
                    verb = %verb.as_char(),
                    raw = %String::from_utf8_lossy(reply),
                    hex = %hex::encode(reply),
                    "corrupt reply: {}",
                    err
                );
            },
        }
        err
    }
}
