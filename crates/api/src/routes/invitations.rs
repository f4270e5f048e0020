//! Public invitation routes: look up and redeem a code.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{Identity, PublicInvitationInfo, User};

use crate::app::AppState;
use crate::error::ApiError;

/// Check whether an invitation code can be redeemed.
///
/// GET /api/v1/invitations/:code
///
/// No authentication. Never consumes a use.
pub async fn get_invitation(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicInvitationInfo>, ApiError> {
    let invitation = state.service.validate_invitation(&code).await?;
    Ok(Json(PublicInvitationInfo::from(&invitation)))
}

/// Redeem an invitation code and register the caller.
///
/// POST /api/v1/invitations/:code/redeem
pub async fn redeem_invitation(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(identity): Json<Identity>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.service.redeem_invitation(&code, identity).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
