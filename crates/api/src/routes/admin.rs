//! Admin routes for managing invitations and viewing users.
//!
//! All handlers here sit behind [`crate::middleware::require_admin`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use domain::models::{CreateInvitationRequest, InvitationView, User};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AdminUser;

#[derive(Debug, Serialize)]
pub struct ListInvitationsResponse {
    pub invitations: Vec<InvitationView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub purged: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

/// GET /api/v1/admin/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
) -> Result<Json<ListInvitationsResponse>, ApiError> {
    let invitations = state.service.list_invitations().await?;
    let total = invitations.len();
    Ok(Json(ListInvitationsResponse { invitations, total }))
}

/// Create a new invitation.
///
/// POST /api/v1/admin/invitations
///
/// Omitted `lifetime_days` and `max_uses` fall back to the configured defaults.
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationView>), ApiError> {
    request.validate()?;

    let defaults = &state.config.invitations;
    let invitation = state
        .service
        .create_invitation(
            request.label,
            request.lifetime_days.unwrap_or(defaults.default_lifetime_days),
            request.max_uses.unwrap_or(defaults.default_max_uses),
        )
        .await?;

    info!(admin = %admin.username, invitation_id = %invitation.id, "Admin created invitation");

    let created_at = invitation.created_at;
    Ok((
        StatusCode::CREATED,
        Json(InvitationView::at(invitation, created_at)),
    ))
}

/// POST /api/v1/admin/invitations/:id/revoke
///
/// Idempotent: revoking twice, or revoking an unknown id, still returns 204.
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.revoke_invitation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/invitations/:id
pub async fn delete_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.service.delete_invitation(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Invitation not found".into()))
    }
}

/// Remove every expired or revoked invitation.
///
/// POST /api/v1/admin/invitations/purge
pub async fn purge_invitations(
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = state.service.purge_expired().await?;
    Ok(Json(PurgeResponse { purged }))
}

/// GET /api/v1/admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<ListUsersResponse>, ApiError> {
    let users = state.service.list_users().await?;
    let total = users.len();
    Ok(Json(ListUsersResponse { users, total }))
}

/// PUT /api/v1/admin/password
pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    state
        .service
        .change_admin_password(&request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
