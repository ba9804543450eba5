//! In-memory store, nothing touches the disk.

use super::trait_def::{DramaStore, StoreError};
use crate::catalog::Snapshot;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryDramaStore {
    snapshot: Mutex<Snapshot>,
}

impl InMemoryDramaStore {
    pub fn with_snapshot(snapshot: Snapshot) -> InMemoryDramaStore {
        InMemoryDramaStore {
            snapshot: Mutex::new(snapshot),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        // A panic while holding the lock can't leave a half-written snapshot,
        // every write is a full swap.
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DramaStore for InMemoryDramaStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.guard().clone())
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.guard() = snapshot.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_owned()
    }
}
