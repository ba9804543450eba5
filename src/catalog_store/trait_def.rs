//! DramaStore trait definition.
//!
//! The store only knows whole snapshots: callers load everything, transform
//! it in memory and hand the full result back to `replace`.

use crate::catalog::Snapshot;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt catalog document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait DramaStore: Send + Sync {
    /// Reads the entire persisted catalog.
    /// When nothing has been persisted yet, an empty catalog is persisted
    /// and returned.
    async fn load(&self) -> Result<Snapshot, StoreError>;

    /// Overwrites the entire persisted catalog. Readers either see the
    /// previous snapshot or this one, never a mix.
    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Human readable location of the data, for logs.
    fn describe(&self) -> String;
}
