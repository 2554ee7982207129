//! Append-only JSON-lines signal store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signalbot_core::error::StoreError;
use signalbot_core::types::{Signal, Trade};
use signalbot_core::SignalStore;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// What was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Record {
    Signal(Signal),
    Trade(Trade),
}

/// One persisted line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub exchange: String,
    pub recorded_at: DateTime<Utc>,
    pub record: Record,
}

impl StoredRecord {
    pub fn new(exchange: &str, record: Record) -> Self {
        Self {
            exchange: exchange.to_string(),
            recorded_at: Utc::now(),
            record,
        }
    }
}

/// Appends one JSON object per line to a file. Writes are serialized so
/// concurrent saves never interleave.
#[derive(Debug)]
pub struct JsonlSignalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored line back, oldest first. A missing file is empty.
    pub async fn load(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }

    async fn append(&self, record: StoredRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl SignalStore for JsonlSignalStore {
    async fn save_signal(&self, exchange: &str, signal: &Signal) -> Result<(), StoreError> {
        self.append(StoredRecord::new(exchange, Record::Signal(signal.clone())))
            .await?;
        info!(
            store = %self.path.display(),
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            "Signal stored"
        );
        Ok(())
    }

    async fn save_trade(&self, exchange: &str, trade: &Trade) -> Result<(), StoreError> {
        self.append(StoredRecord::new(exchange, Record::Trade(trade.clone())))
            .await
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
