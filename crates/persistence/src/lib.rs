//! Persistence layer for the Welcomarr backend.
//!
//! This crate contains:
//! - The snapshot backend abstraction and its in-memory and JSON file implementations
//! - The invitation store, which serializes every read-modify-write
//! - Store metrics

pub mod backends;
pub mod error;
pub mod metrics;
pub mod store;

pub use backends::{JsonFileBackend, MemoryBackend, SnapshotBackend};
pub use error::StoreError;
pub use store::InvitationStore;
