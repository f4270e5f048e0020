use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_admin, trace_id};
use crate::routes::{admin, health, invitations};
use crate::services::InvitationService;

#[derive(Clone)]
pub struct AppState {
    pub service: InvitationService,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, service: InvitationService) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        service,
        config: config.clone(),
    };

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Invitation lookup and redemption (no authentication)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/invitations/:code", get(invitations::get_invitation))
        .route(
            "/api/v1/invitations/:code/redeem",
            post(invitations::redeem_invitation),
        );

    // Admin routes (HTTP Basic against the stored admin credentials)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/invitations",
            get(admin::list_invitations).post(admin::create_invitation),
        )
        .route(
            "/api/v1/admin/invitations/purge",
            post(admin::purge_invitations),
        )
        .route(
            "/api/v1/admin/invitations/:id",
            axum::routing::delete(admin::delete_invitation),
        )
        .route(
            "/api/v1/admin/invitations/:id/revoke",
            post(admin::revoke_invitation),
        )
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/password", put(admin::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
