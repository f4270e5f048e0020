//! Admin authentication middleware.
//!
//! Admin routes use HTTP Basic authentication checked against the admin
//! credentials held in the invitation store.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated administrator, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
}

/// Middleware for admin-only routes.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_credentials);

    let (username, password) = match credentials {
        Some(credentials) => credentials,
        None => {
            return ApiError::Unauthorized("Missing or malformed credentials".into())
                .into_response();
        }
    };

    match state.service.verify_admin(&username, &password).await {
        Ok(true) => {
            req.extensions_mut().insert(AdminUser { username });
            next.run(req).await
        }
        Ok(false) => {
            tracing::warn!(username = %username, "Rejected admin login");
            ApiError::Unauthorized("Invalid credentials".into()).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Parses `Basic <base64(username:password)>`.
fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
