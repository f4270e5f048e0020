//! Common test utilities for integration tests.
//!
//! Every test app runs over an in-memory store with a manual clock and a
//! recording provisioner, so tests are hermetic and can move time forward.

// Not every integration test uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use domain::models::AdminCredentials;
use domain::services::{ManualClock, MockProvisioner};
use fake::{faker::internet::en::Username, Fake};
use persistence::InvitationStore;
use shared::password::hash_password;
use tower::ServiceExt;
use welcomarr_api::{app::create_app, config::Config, services::InvitationService};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin";

/// A running test app plus handles to its time and provisioning seams.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub provisioner: Arc<MockProvisioner>,
    pub service: InvitationService,
}

pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn test_config() -> Config {
    Config::load_for_test(&[("logging.level", "debug"), ("logging.format", "pretty")])
        .expect("Failed to load test config")
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config(), MockProvisioner::new())
}

pub fn create_test_app_with(config: Config, provisioner: MockProvisioner) -> TestApp {
    let clock = Arc::new(ManualClock::new(test_start()));
    let provisioner = Arc::new(provisioner);
    let store = InvitationStore::in_memory(AdminCredentials {
        username: ADMIN_USERNAME.to_string(),
        password_hash: hash_password(ADMIN_PASSWORD).expect("Failed to hash test password"),
    });
    let service = InvitationService::new(store, clock.clone(), provisioner.clone());
    let router = create_app(config, service.clone());

    TestApp {
        router,
        clock,
        provisioner,
        service,
    }
}

/// Generates a username that satisfies the username rules.
pub fn unique_username() -> String {
    let base: String = Username()
        .fake::<String>()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .take(20)
        .collect();
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..6];
    format!("{}{}", base, suffix)
}

pub fn identity_json() -> serde_json::Value {
    let username = unique_username();
    serde_json::json!({
        "email": format!("{}@example.com", username),
        "username": username,
    })
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

pub fn admin_auth() -> String {
    basic_auth(ADMIN_USERNAME, ADMIN_PASSWORD)
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn admin_request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, admin_auth());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// Creates an invitation through the admin API and returns the response JSON.
pub async fn create_invitation(app: &Router, body: serde_json::Value) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/admin/invitations",
            Some(body),
        ))
        .await
        .unwrap();
    let status = response.status();
    let json = parse_response_body(response).await;
    assert!(status.is_success(), "create failed: {} {}", status, json);
    json
}

/// Waits for the background provisioning task to reach the mock.
pub async fn wait_for_provisioning(provisioner: &MockProvisioner, expected: usize) {
    for _ in 0..100 {
        if provisioner.requests().len() >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("provisioner was not called {} times", expected);
}
