use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::models::Rejection;
use serde::Serialize;
use thiserror::Error;

use crate::services::InvitationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(Rejection),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Rejected(rejection) => {
                let (status, code) = match rejection {
                    Rejection::NotFound => (StatusCode::NOT_FOUND, "invitation_not_found"),
                    Rejection::Expired => (StatusCode::GONE, "invitation_expired"),
                    Rejection::Exhausted => (StatusCode::GONE, "invitation_exhausted"),
                };
                (status, code, rejection.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Storage is temporarily unavailable".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        if matches!(self, ApiError::Unauthorized(_)) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="welcomarr""#)],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}

impl From<InvitationError> for ApiError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::InvalidParameters(msg) => ApiError::Validation(msg),
            InvitationError::Rejected(rejection) => ApiError::Rejected(rejection),
            InvitationError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".into())
            }
            InvitationError::StoreUnavailable(e) => ApiError::ServiceUnavailable(e.to_string()),
            InvitationError::CodeSpaceExhausted(e) => ApiError::Internal(e.to_string()),
            InvitationError::Password(e) => ApiError::Internal(e.to_string()),
            InvitationError::Task(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(_, errors)| {
                errors
                    .iter()
                    .map(|e| e.message.clone().map(|m| m.to_string()).unwrap_or_default())
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::StoreError;

    #[test]
    fn test_api_error_unauthorized_challenges() {
        let response = ApiError::Unauthorized("no".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn test_api_error_validation() {
        let response = ApiError::Validation("invalid input".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rejections_map_to_distinct_statuses() {
        let cases = [
            (Rejection::NotFound, StatusCode::NOT_FOUND),
            (Rejection::Expired, StatusCode::GONE),
            (Rejection::Exhausted, StatusCode::GONE),
        ];
        for (rejection, status) in cases {
            let response = ApiError::Rejected(rejection).into_response();
            assert_eq!(response.status(), status, "{:?}", rejection);
        }
    }

    #[test]
    fn test_store_failure_is_service_unavailable() {
        let err: ApiError = InvitationError::StoreUnavailable(StoreError::Io(
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ))
        .into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invitation_error_mapping() {
        assert!(matches!(
            ApiError::from(InvitationError::InvalidParameters("bad".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(InvitationError::Rejected(Rejection::Expired)),
            ApiError::Rejected(Rejection::Expired)
        ));
        assert!(matches!(
            ApiError::from(InvitationError::InvalidCredentials),
            ApiError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Rejected(Rejection::Exhausted)),
            "Invitation has reached its maximum number of uses"
        );
        assert_eq!(
            format!("{}", ApiError::NotFound("x".to_string())),
            "Not found: x"
        );
    }
}
