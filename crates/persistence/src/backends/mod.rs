//! Snapshot backends: where the single snapshot document lives.

mod json_file;
mod memory;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;

use domain::models::Snapshot;

use crate::error::StoreError;

/// Raw storage for one snapshot document.
///
/// Backends only read and replace whole snapshots. Serializing concurrent
/// writers is the job of [`crate::InvitationStore`], not the backend.
#[async_trait::async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Reads the stored snapshot, or `None` if nothing was ever written.
    async fn read(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replaces the stored snapshot. A failed write leaves the previous
    /// snapshot readable and unchanged.
    async fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
