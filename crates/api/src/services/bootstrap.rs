//! Startup wiring for the invitation service.
//!
//! Opens the store and, on the very first start, seeds it with the
//! configured admin credentials. Later starts keep the stored hash.

use std::sync::Arc;

use domain::models::AdminCredentials;
use domain::services::SystemClock;
use persistence::{InvitationStore, JsonFileBackend, StoreError};
use shared::password::{hash_password, PasswordError};
use tracing::info;

use crate::config::Config;
use crate::services::webhook::{build_provisioner, ProvisionerSetupError};
use crate::services::InvitationService;

/// Error types for service bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Provisioner error: {0}")]
    Provisioner(#[from] ProvisionerSetupError),
}

/// Builds the invitation service described by `config` and checks the store
/// is readable.
pub async fn bootstrap_service(config: &Config) -> Result<InvitationService, BootstrapError> {
    let bootstrap_admin = AdminCredentials {
        username: config.admin.username.clone(),
        password_hash: hash_password(&config.admin.initial_password)?,
    };

    let backend = Arc::new(JsonFileBackend::new(&config.storage.path));
    let store = InvitationStore::new(backend, bootstrap_admin);
    let snapshot = store.load().await?;

    info!(
        path = %config.storage.path,
        invitations = snapshot.invitations.len(),
        users = snapshot.users.len(),
        admin = %snapshot.admin.username,
        "Invitation store opened"
    );

    let provisioner = build_provisioner(&config.provisioning)?;
    Ok(InvitationService::new(
        store,
        Arc::new(SystemClock),
        provisioner,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bootstrap_seeds_admin_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let path_str = path.to_str().unwrap();

        let config = Config::load_for_test(&[
            ("storage.path", path_str),
            ("admin.initial_password", "first-password"),
        ])
        .unwrap();
        let service = bootstrap_service(&config).await.unwrap();
        assert!(service.verify_admin("admin", "first-password").await.unwrap());
        assert!(path.exists());

        // A changed initial password is ignored once the store exists.
        let config = Config::load_for_test(&[
            ("storage.path", path_str),
            ("admin.initial_password", "second-password"),
        ])
        .unwrap();
        let service = bootstrap_service(&config).await.unwrap();
        assert!(service.verify_admin("admin", "first-password").await.unwrap());
        assert!(!service.verify_admin("admin", "second-password").await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_fails_on_corrupt_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let config =
            Config::load_for_test(&[("storage.path", path.to_str().unwrap())]).unwrap();
        assert!(matches!(
            bootstrap_service(&config).await,
            Err(BootstrapError::Store(StoreError::Corrupt(_)))
        ));
    }
}
