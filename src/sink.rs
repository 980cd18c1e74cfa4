//! Persistence sink capability.
//!
//! The engine's durable output is a stream of append-only records: mission
//! events and learning signals. Where they land (document store, queue,
//! plain file) is an external concern behind this trait. A sink failure is
//! logged and flagged for reconciliation by the caller; it never blocks the
//! user-visible response.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

/// One record bound for durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Which log this belongs to ("missions" or "signals").
    pub stream: String,
    pub payload: Value,
    pub at: DateTime<Utc>,
}

impl SinkRecord {
    pub fn new(stream: impl Into<String>, payload: Value) -> Self {
        Self {
            stream: stream.into(),
            payload,
            at: Utc::now(),
        }
    }
}

/// Append-only persistence.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Append one record. Returning `Ok` is the ack.
    async fn append(&self, record: &SinkRecord) -> anyhow::Result<()>;
}

/// Discards everything. For tests and for embedders that keep their own
/// copy of the streams.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PersistenceSink for NullSink {
    async fn append(&self, _record: &SinkRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// JSON Lines file sink, one record per line.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PersistenceSink for JsonlSink {
    async fn append(&self, record: &SinkRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}
