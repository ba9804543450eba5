//! Catalog persisted as a single JSON document on disk.

use super::trait_def::{DramaStore, StoreError};
use crate::catalog::Snapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct JsonFileDramaStore {
    file_path: PathBuf,
}

impl JsonFileDramaStore {
    pub fn new<P: AsRef<Path>>(file_path: P) -> JsonFileDramaStore {
        JsonFileDramaStore {
            file_path: file_path.as_ref().to_owned(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .file_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_owned());
        self.file_path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ))
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Writes `snapshot` to a fresh temp file next to the catalog.
    async fn write_temp(&self, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
        self.ensure_parent_dir().await?;
        let json_string = serde_json::to_string_pretty(snapshot)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json_string.as_bytes()).await?;
        Ok(temp_path)
    }

    /// Puts an empty catalog in place when there is none yet.
    ///
    /// The empty document is linked into place, which fails instead of
    /// overwriting when another writer created the file in the meantime. In
    /// that case the winner's catalog is read back.
    async fn initialize(&self) -> Result<Snapshot, StoreError> {
        let empty = Snapshot::default();
        let temp_path = self.write_temp(&empty).await?;
        let linked = tokio::fs::hard_link(&temp_path, &self.file_path).await;
        let _ = tokio::fs::remove_file(&temp_path).await;

        match linked {
            Ok(()) => {
                info!(
                    "No catalog at {}, initialized an empty one.",
                    self.file_path.display()
                );
                Ok(empty)
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                let content = tokio::fs::read_to_string(&self.file_path).await?;
                Ok(serde_json::from_str(&content)?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl DramaStore for JsonFileDramaStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => self.initialize().await,
            Err(err) => Err(err.into()),
        }
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let temp_path = self.write_temp(snapshot).await?;
        if let Err(err) = tokio::fs::rename(&temp_path, &self.file_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(err.into());
        }
        debug!(
            "Wrote {} dramas to {}",
            snapshot.dramas.len(),
            self.file_path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.file_path.display().to_string()
    }
}
