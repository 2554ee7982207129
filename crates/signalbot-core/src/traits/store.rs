//! Signal persistence trait.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Signal, Trade};

/// Write-only sink for signals and trades. The pipeline never reads back
/// what it stored within a run.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn save_signal(&self, exchange: &str, signal: &Signal) -> Result<(), StoreError>;

    async fn save_trade(&self, exchange: &str, trade: &Trade) -> Result<(), StoreError>;

    fn name(&self) -> &str;
}
