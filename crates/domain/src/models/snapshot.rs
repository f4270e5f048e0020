//! The full persisted state: admin credentials, invitations and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation::{Invitation, Rejection};
use super::user::User;

/// Current snapshot document format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Credentials of the single administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminCredentials {
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Everything the invitation store persists, as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Snapshot {
    pub version: u32,
    pub admin: AdminCredentials,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Snapshot {
    /// An empty snapshot, as written on first-ever use.
    pub fn new(admin: AdminCredentials) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            admin,
            invitations: Vec::new(),
            users: Vec::new(),
        }
    }

    /// Looks up a non-revoked invitation by its (normalized) code.
    pub fn find_active_by_code(&self, code: &str) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|inv| inv.active && inv.code == code)
    }

    pub fn find_active_by_code_mut(&mut self, code: &str) -> Option<&mut Invitation> {
        self.invitations
            .iter_mut()
            .find(|inv| inv.active && inv.code == code)
    }

    /// Resolves a code to a redeemable invitation, checking
    /// NotFound, then Expired, then Exhausted.
    pub fn find_redeemable(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<&Invitation, Rejection> {
        let invitation = self.find_active_by_code(code).ok_or(Rejection::NotFound)?;
        invitation.check_redeemable(now)?;
        Ok(invitation)
    }

    /// Whether a non-revoked invitation already uses `code`.
    pub fn is_code_active(&self, code: &str) -> bool {
        self.find_active_by_code(code).is_some()
    }

    pub fn invitation_mut(&mut self, id: Uuid) -> Option<&mut Invitation> {
        self.invitations.iter_mut().find(|inv| inv.id == id)
    }

    /// Removes an invitation record. Returns whether one was removed.
    pub fn remove_invitation(&mut self, id: Uuid) -> bool {
        let before = self.invitations.len();
        self.invitations.retain(|inv| inv.id != id);
        self.invitations.len() != before
    }
}
