//! The invitation store: serialized access to the persisted snapshot.

use std::sync::Arc;

use domain::models::{AdminCredentials, Snapshot, SNAPSHOT_VERSION};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use crate::backends::{MemoryBackend, SnapshotBackend};
use crate::error::StoreError;
use crate::metrics::StoreTimer;

/// Owns the canonical invitations and users.
///
/// Clones share the same backend and the same write lock, so every
/// [`InvitationStore::mutate`] on any clone runs as one serialized
/// load-transform-save transaction.
#[derive(Clone)]
pub struct InvitationStore {
    backend: Arc<dyn SnapshotBackend>,
    write_lock: Arc<Mutex<()>>,
    bootstrap_admin: AdminCredentials,
}

impl InvitationStore {
    /// Creates a store over `backend`.
    ///
    /// `bootstrap_admin` is only written when the backend has never held a
    /// snapshot.
    pub fn new(backend: Arc<dyn SnapshotBackend>, bootstrap_admin: AdminCredentials) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
            bootstrap_admin,
        }
    }

    /// A store backed by a fresh [`MemoryBackend`].
    pub fn in_memory(bootstrap_admin: AdminCredentials) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), bootstrap_admin)
    }

    /// Returns the current snapshot.
    ///
    /// Does not wait for in-flight mutations unless the store has never been
    /// written, in which case the initial snapshot is persisted first.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        let timer = StoreTimer::new("load");
        let result = match self.backend.read().await {
            Ok(Some(snapshot)) => check_version(snapshot),
            Ok(None) => {
                let guard = self.write_lock.clone().lock_owned().await;
                self.load_locked(guard).await.map(|(snapshot, _guard)| snapshot)
            }
            Err(e) => Err(e),
        };
        timer.finish(result.is_ok());
        result
    }

    /// Replaces the persisted snapshot wholesale.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let timer = StoreTimer::new("save");
        let guard = self.write_lock.clone().lock_owned().await;
        let result = self.write_locked(snapshot.clone(), guard).await.map(drop);
        timer.finish(result.is_ok());
        result
    }

    /// Loads, applies `f`, and saves, as one critical section.
    ///
    /// If `f` returns an error nothing is written and the error is passed
    /// through. Store failures are converted into `E`. Once the write has
    /// started it runs to completion even if the returned future is dropped.
    pub async fn mutate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self.write_lock.clone().lock_owned().await;
        let timer = StoreTimer::new("mutate");

        let (mut snapshot, guard) = match self.load_locked(guard).await {
            Ok(loaded) => loaded,
            Err(e) => {
                timer.finish(false);
                return Err(e.into());
            }
        };

        let value = f(&mut snapshot)?;

        let written = self.write_locked(snapshot, guard).await;
        timer.finish(written.is_ok());
        written?;
        Ok(value)
    }

    /// Reads the snapshot, initializing it on first use.
    async fn load_locked(
        &self,
        guard: OwnedMutexGuard<()>,
    ) -> Result<(Snapshot, OwnedMutexGuard<()>), StoreError> {
        match self.backend.read().await? {
            Some(snapshot) => Ok((check_version(snapshot)?, guard)),
            None => {
                let snapshot = Snapshot::new(self.bootstrap_admin.clone());
                let guard = self.write_locked(snapshot.clone(), guard).await?;
                info!(
                    admin = %snapshot.admin.username,
                    "Initialized empty invitation store"
                );
                Ok((snapshot, guard))
            }
        }
    }

    /// Writes `snapshot` on a spawned task that owns the write lock.
    ///
    /// Dropping the caller cannot interrupt the write or release the lock
    /// while the backend is still touching storage. The guard is handed back
    /// so the caller can keep the critical section open.
    async fn write_locked(
        &self,
        snapshot: Snapshot,
        guard: OwnedMutexGuard<()>,
    ) -> Result<OwnedMutexGuard<()>, StoreError> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            backend.write(&snapshot).await?;
            Ok::<_, StoreError>(guard)
        })
        .await?
    }
}

fn check_version(snapshot: Snapshot) -> Result<Snapshot, StoreError> {
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    Ok(snapshot)
}
