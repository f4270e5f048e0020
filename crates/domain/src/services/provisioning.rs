//! Downstream account provisioning on the shared media service.
//!
//! Redemption hands the new user to a [`MediaProvisioner`] without waiting
//! for it. A failed provisioning call does not undo the redemption.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Identity, User};

/// Payload sent downstream after a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvisioningRequest {
    pub user_id: Uuid,
    pub invitation_id: Uuid,
    #[serde(flatten)]
    pub identity: Identity,
}

impl From<&User> for ProvisioningRequest {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            invitation_id: user.invitation_id,
            identity: user.identity.clone(),
        }
    }
}

/// Result of a provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningResult {
    /// Access was granted on the media service.
    Provisioned,
    /// Provisioning failed with the given reason.
    Failed(String),
}

/// Grants a newly registered user access to the media service.
#[async_trait::async_trait]
pub trait MediaProvisioner: Send + Sync {
    /// Provision access for a freshly redeemed invitation.
    async fn provision(&self, request: ProvisioningRequest) -> ProvisioningResult;
}

/// Provisioner that only logs and records what it would have done.
///
/// Used for development and testing.
#[derive(Debug, Default)]
pub struct MockProvisioner {
    simulate_failure: bool,
    requests: Mutex<Vec<ProvisioningRequest>>,
}

impl MockProvisioner {
    /// Create a new mock provisioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provisioner that reports every call as failed.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<ProvisioningRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait::async_trait]
impl MediaProvisioner for MockProvisioner {
    async fn provision(&self, request: ProvisioningRequest) -> ProvisioningResult {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request.clone()),
            Err(e) => e.into_inner().push(request.clone()),
        }

        if self.simulate_failure {
            tracing::warn!(
                user_id = %request.user_id,
                invitation_id = %request.invitation_id,
                "Mock provisioner simulating failure"
            );
            return ProvisioningResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            user_id = %request.user_id,
            invitation_id = %request.invitation_id,
            username = %request.identity.username,
            "Mock: Would grant media server access"
        );

        ProvisioningResult::Provisioned
    }
}
