//! Webhook-based media provisioning.
//!
//! POSTs each [`ProvisioningRequest`] as JSON to a configured endpoint,
//! typically a small bridge that creates the account on the media server.

use std::sync::Arc;
use std::time::Duration;

use domain::services::{MediaProvisioner, MockProvisioner, ProvisioningRequest, ProvisioningResult};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProvisioningConfig;

/// Errors that can occur while building a provisioner.
#[derive(Debug, Error)]
pub enum ProvisionerSetupError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unknown provisioning provider: {0}")]
    UnknownProvider(String),
}

/// Provisioner that calls out to an HTTP endpoint.
pub struct WebhookProvisioner {
    client: Client,
    url: String,
}

impl WebhookProvisioner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl MediaProvisioner for WebhookProvisioner {
    async fn provision(&self, request: ProvisioningRequest) -> ProvisioningResult {
        debug!(user_id = %request.user_id, url = %self.url, "Sending provisioning request");

        let response = match self.client.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => return ProvisioningResult::Failed(format!("Request failed: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            ProvisioningResult::Provisioned
        } else {
            ProvisioningResult::Failed(format!("Endpoint responded with {}", status.as_u16()))
        }
    }
}

/// Builds the provisioner selected by `config.provider`.
pub fn build_provisioner(
    config: &ProvisioningConfig,
) -> Result<Arc<dyn MediaProvisioner>, ProvisionerSetupError> {
    match config.provider.as_str() {
        "log" => {
            info!("Using logging media provisioner");
            Ok(Arc::new(MockProvisioner::new()))
        }
        "webhook" => {
            info!(url = %config.webhook_url, "Using webhook media provisioner");
            let provisioner = WebhookProvisioner::new(
                config.webhook_url.clone(),
                Duration::from_millis(config.timeout_ms),
            )?;
            Ok(Arc::new(provisioner))
        }
        other => Err(ProvisionerSetupError::UnknownProvider(other.to_string())),
    }
}
