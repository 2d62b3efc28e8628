//! Common test utilities and fixtures.

#![allow(dead_code)]

use bolo_lib::core::EngineConfig;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Engine config pointing at `endpoint` with short timeouts.
pub fn engine_config(endpoint: String) -> EngineConfig {
    EngineConfig {
        endpoint,
        connect_timeout: Duration::from_secs(2),
        io_timeout: Duration::from_secs(2),
    }
}

/// Stub engine answering `replies.len()` requests in order.
///
/// Each connection's request line is collected and returned by the handle.
pub async fn query_engine(replies: Vec<Vec<u8>>) -> (EngineConfig, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            requests.push(line);

            let mut stream = reader.into_inner();
            stream.write_all(&reply).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        requests
    });

    (engine_config(addr.to_string()), handle)
}

/// Stub engine accepting `connections` submission connections.
///
/// Returns every submitted line, per connection, sorted for stable asserts.
pub async fn submission_engine(connections: usize) -> (EngineConfig, JoinHandle<Vec<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut batches = Vec::new();
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut body = String::new();
            stream.read_to_string(&mut body).await.unwrap();
            let mut lines: Vec<String> = body.lines().map(str::to_string).collect();
            lines.sort();
            batches.push(lines);
        }
        batches
    });

    (engine_config(addr.to_string()), handle)
}

/// Stub engine accepting any number of submission connections.
///
/// Each connection is drained on its own task and its sorted lines sent on the
/// returned channel once the writer closes.
pub async fn streaming_engine() -> (EngineConfig, mpsc::UnboundedReceiver<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut body = String::new();
                stream.read_to_string(&mut body).await.unwrap();
                let mut lines: Vec<String> = body.lines().map(str::to_string).collect();
                lines.sort();
                let _ = tx.send(lines);
            });
        }
    });

    (engine_config(addr.to_string()), rx)
}

/// An address nothing is listening on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}
