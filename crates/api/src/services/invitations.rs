//! Invitation lifecycle: create, validate, redeem and revoke.
//!
//! Every operation reads fresh state from the [`InvitationStore`]. Anything
//! that writes does its checks inside the same `mutate` call that persists
//! the result, so a redemption never acts on a validation made earlier.

use std::sync::Arc;

use domain::models::invitation::{
    generate_unique_code, normalize_code, CodeSpaceExhausted, MAX_LIFETIME_DAYS, MAX_USES_LIMIT,
};
use domain::models::{Identity, Invitation, InvitationStatus, InvitationView, Rejection, User};
use domain::services::{Clock, MediaProvisioner, ProvisioningRequest, ProvisioningResult};
use metrics::counter;
use persistence::{InvitationStore, StoreError};
use shared::password::{hash_password, verify_password, PasswordError};
use shared::validation::{normalize_optional_text, validate_label};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Errors returned by the invitation lifecycle.
///
/// `Rejected` is a normal outcome of redemption; everything else is a fault.
#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    CodeSpaceExhausted(#[from] CodeSpaceExhausted),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("Invalid admin credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl InvitationError {
    /// Whether this is a redemption rejection rather than a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, InvitationError::Rejected(_))
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            InvitationError::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

/// The invitation lifecycle manager.
#[derive(Clone)]
pub struct InvitationService {
    store: InvitationStore,
    clock: Arc<dyn Clock>,
    provisioner: Arc<dyn MediaProvisioner>,
}

impl InvitationService {
    pub fn new(
        store: InvitationStore,
        clock: Arc<dyn Clock>,
        provisioner: Arc<dyn MediaProvisioner>,
    ) -> Self {
        Self {
            store,
            clock,
            provisioner,
        }
    }

    pub fn store(&self) -> &InvitationStore {
        &self.store
    }

    /// Mints a new invitation with a code unique among active invitations.
    pub async fn create_invitation(
        &self,
        label: Option<String>,
        lifetime_days: i64,
        max_uses: i32,
    ) -> Result<Invitation, InvitationError> {
        let label = normalize_optional_text(label);
        validate_creation(label.as_deref(), lifetime_days, max_uses)?;

        let invitation = self
            .store
            .mutate(|snapshot| -> Result<Invitation, InvitationError> {
                let code = generate_unique_code(|code| snapshot.is_code_active(code))?;
                let invitation =
                    Invitation::new(code, label, self.clock.now(), lifetime_days, max_uses);
                snapshot.invitations.push(invitation.clone());
                Ok(invitation)
            })
            .await?;

        counter!("invitations_created_total").increment(1);
        info!(
            invitation_id = %invitation.id,
            code = %invitation.code,
            max_uses = invitation.max_uses,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(invitation)
    }

    /// Makes an invitation permanently unusable.
    ///
    /// Unknown or already revoked ids are a silent no-op.
    pub async fn revoke_invitation(&self, id: Uuid) -> Result<(), InvitationError> {
        let revoked = self
            .store
            .mutate(|snapshot| {
                let revoked = match snapshot.invitation_mut(id) {
                    Some(invitation) if invitation.active => {
                        invitation.revoke();
                        true
                    }
                    _ => false,
                };
                Ok::<_, InvitationError>(revoked)
            })
            .await?;

        if revoked {
            info!(invitation_id = %id, "Invitation revoked");
        } else {
            debug!(invitation_id = %id, "Revoke was a no-op");
        }
        Ok(())
    }

    /// Checks whether `code` could be redeemed right now. Never mutates state.
    pub async fn validate_invitation(&self, code: &str) -> Result<Invitation, InvitationError> {
        let code = normalize_code(code);
        let snapshot = self.store.load().await?;

        match snapshot.find_redeemable(&code, self.clock.now()) {
            Ok(invitation) => Ok(invitation.clone()),
            Err(rejection) => {
                debug!(code = %code, reason = rejection.reason(), "Invitation not valid");
                Err(rejection.into())
            }
        }
    }

    /// Consumes one use of `code` and registers `identity` as a new user.
    ///
    /// Validity is re-checked inside the same critical section that records
    /// the use. On success, provisioning on the media service is started in
    /// the background and not awaited.
    pub async fn redeem_invitation(
        &self,
        code: &str,
        identity: Identity,
    ) -> Result<User, InvitationError> {
        let code = normalize_code(code);
        let identity = identity.normalized();
        identity.validate().map_err(describe_validation_errors)?;

        let result = self
            .store
            .mutate(|snapshot| -> Result<User, InvitationError> {
                let now = self.clock.now();
                let invitation = snapshot
                    .find_active_by_code_mut(&code)
                    .ok_or(Rejection::NotFound)?;
                invitation.check_redeemable(now)?;
                invitation.record_use();

                let user = User::new(identity, invitation.id, now);
                snapshot.users.push(user.clone());
                Ok(user)
            })
            .await;

        let user = match result {
            Ok(user) => user,
            Err(InvitationError::Rejected(rejection)) => {
                counter!("invitation_rejections_total", "reason" => rejection.reason())
                    .increment(1);
                info!(code = %code, reason = rejection.reason(), "Redemption rejected");
                return Err(rejection.into());
            }
            Err(e) => return Err(e),
        };

        counter!("invitations_redeemed_total").increment(1);
        info!(
            user_id = %user.id,
            invitation_id = %user.invitation_id,
            username = %user.identity.username,
            "Invitation redeemed"
        );

        self.spawn_provisioning(ProvisioningRequest::from(&user));
        Ok(user)
    }

    fn spawn_provisioning(&self, request: ProvisioningRequest) {
        let provisioner = Arc::clone(&self.provisioner);
        tokio::spawn(async move {
            let user_id = request.user_id;
            match provisioner.provision(request).await {
                ProvisioningResult::Provisioned => {
                    info!(user_id = %user_id, "Media access provisioned");
                }
                ProvisioningResult::Failed(reason) => {
                    warn!(
                        user_id = %user_id,
                        reason = %reason,
                        "Media access provisioning failed; redemption stands"
                    );
                }
            }
        });
    }

    /// All invitations with their status at the current time.
    pub async fn list_invitations(&self) -> Result<Vec<InvitationView>, InvitationError> {
        let snapshot = self.store.load().await?;
        let now = self.clock.now();
        Ok(snapshot
            .invitations
            .into_iter()
            .map(|invitation| InvitationView::at(invitation, now))
            .collect())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, InvitationError> {
        Ok(self.store.load().await?.users)
    }

    /// Removes an invitation record entirely. Returns whether one existed.
    pub async fn delete_invitation(&self, id: Uuid) -> Result<bool, InvitationError> {
        let removed = self
            .store
            .mutate(|snapshot| Ok::<_, InvitationError>(snapshot.remove_invitation(id)))
            .await?;

        if removed {
            info!(invitation_id = %id, "Invitation deleted");
        }
        Ok(removed)
    }

    /// Removes every expired or revoked invitation. Returns how many went.
    pub async fn purge_expired(&self) -> Result<usize, InvitationError> {
        let purged = self
            .store
            .mutate(|snapshot| {
                let now = self.clock.now();
                let before = snapshot.invitations.len();
                snapshot.invitations.retain(|invitation| {
                    !matches!(
                        invitation.status(now),
                        InvitationStatus::Expired | InvitationStatus::Revoked
                    )
                });
                Ok::<_, InvitationError>(before - snapshot.invitations.len())
            })
            .await?;

        info!(purged, "Purged expired and revoked invitations");
        Ok(purged)
    }

    /// Checks a username/password pair against the stored admin credentials.
    pub async fn verify_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, InvitationError> {
        let admin = self.store.load().await?.admin;
        let username_matches = admin.username == username;

        // The hash is checked for every username so a wrong name costs the same.
        let password = password.to_string();
        let password_matches =
            run_blocking(move || check_admin_password(&password, &admin.password_hash)).await?;

        Ok(username_matches && password_matches)
    }

    /// Replaces the admin password after checking the current one.
    pub async fn change_admin_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), InvitationError> {
        if new_password.is_empty() {
            return Err(InvitationError::InvalidParameters(
                "new_password must not be empty".to_string(),
            ));
        }

        let checked_hash = self.store.load().await?.admin.password_hash;
        let current_password = current_password.to_string();
        let new_password = new_password.to_string();
        let stored_hash = checked_hash.clone();
        let new_hash = run_blocking(move || {
            if !check_admin_password(&current_password, &stored_hash)? {
                return Err(InvitationError::InvalidCredentials);
            }
            Ok(hash_password(&new_password)?)
        })
        .await?;

        self.store
            .mutate(|snapshot| -> Result<(), InvitationError> {
                // A concurrent change replaced the hash we checked against.
                if snapshot.admin.password_hash != checked_hash {
                    return Err(InvitationError::InvalidCredentials);
                }
                snapshot.admin.password_hash = new_hash;
                Ok(())
            })
            .await?;

        info!("Admin password changed");
        Ok(())
    }
}

/// Runs CPU-heavy password work off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, InvitationError>
where
    F: FnOnce() -> Result<T, InvitationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| InvitationError::Task(e.to_string()))?
}

fn check_admin_password(password: &str, hash: &str) -> Result<bool, InvitationError> {
    match verify_password(password, hash) {
        Ok(matches) => Ok(matches),
        Err(PasswordError::InvalidHashFormat) => {
            warn!("Stored admin password hash is malformed; rejecting login");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn validate_creation(
    label: Option<&str>,
    lifetime_days: i64,
    max_uses: i32,
) -> Result<(), InvitationError> {
    if !(0..=MAX_LIFETIME_DAYS).contains(&lifetime_days) {
        return Err(InvitationError::InvalidParameters(format!(
            "lifetime_days must be between 0 and {}",
            MAX_LIFETIME_DAYS
        )));
    }
    if !(1..=MAX_USES_LIMIT).contains(&max_uses) {
        return Err(InvitationError::InvalidParameters(format!(
            "max_uses must be between 1 and {}",
            MAX_USES_LIMIT
        )));
    }
    if let Some(label) = label {
        validate_label(label).map_err(|e| {
            InvitationError::InvalidParameters(
                e.message.map(|m| m.to_string()).unwrap_or_default(),
            )
        })?;
    }
    Ok(())
}

/// Flattens validator errors into one "field: message" line.
pub fn describe_validation_errors(errors: ValidationErrors) -> InvitationError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |err| {
                format!("{}: {}", field, err.message.as_deref().unwrap_or(""))
            })
        })
        .collect();
    messages.sort();
    InvitationError::InvalidParameters(messages.join(", "))
}
