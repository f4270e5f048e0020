use std::ffi::OsString;
use std::path::{Path, PathBuf};

use domain::models::Snapshot;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::SnapshotBackend;
use crate::error::StoreError;

/// Stores the snapshot as one pretty-printed JSON document.
///
/// Writes go to a sibling `.tmp` file which is fsynced and then renamed
/// over the target, and the directory is fsynced after the rename, so a
/// reader sees either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write_temp(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Flushes the directory entry so the rename survives a crash.
    #[cfg(unix)]
    async fn sync_parent(&self) -> Result<(), StoreError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        tokio::fs::File::open(parent).await?.sync_all().await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl SnapshotBackend for JsonFileBackend {
    async fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.temp_path();

        if let Err(e) = self.write_temp(&temp_path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                debug!(path = %temp_path.display(), error = %cleanup, "No temp file to clean up");
            }
            warn!(path = %self.path.display(), error = %e, "Failed to write snapshot");
            return Err(e);
        }

        tokio::fs::rename(&temp_path, &self.path).await?;
        self.sync_parent().await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Saved snapshot");
        Ok(())
    }
}
