use std::sync::atomic::{AtomicBool, Ordering};

use domain::models::Snapshot;
use tokio::sync::RwLock;

use super::SnapshotBackend;
use crate::error::StoreError;

/// In-process backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    snapshot: RwLock<Option<Snapshot>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// A backend whose writes all fail, as if the disk were full.
    pub fn failing() -> Self {
        let backend = Self::new();
        backend.set_fail_writes(true);
        backend
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }
}
