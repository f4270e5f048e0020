//! Store error type.

use thiserror::Error;

/// Failure to read or write persisted state.
///
/// Every variant means the store is unavailable; the previously persisted
/// snapshot is left intact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Store unavailable: snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Store unavailable: write task failed: {0}")]
    WriteTask(#[from] tokio::task::JoinError),
}
