use domain::models::invitation::{MAX_LIFETIME_DAYS, MAX_USES_LIMIT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub invitations: InvitationDefaults,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON snapshot document.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Administrator credentials written on the very first start.
///
/// Once the store exists the stored hash wins and these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default)]
    pub initial_password: String,
}

/// Values used when a create request omits them.
#[derive(Debug, Clone, Deserialize)]
pub struct InvitationDefaults {
    #[serde(default = "default_lifetime_days")]
    pub default_lifetime_days: i64,

    #[serde(default = "default_max_uses")]
    pub default_max_uses: i32,
}

impl Default for InvitationDefaults {
    fn default() -> Self {
        Self {
            default_lifetime_days: default_lifetime_days(),
            default_max_uses: default_max_uses(),
        }
    }
}

/// Media service provisioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    /// "log" (development) or "webhook"
    #[serde(default = "default_provisioning_provider")]
    pub provider: String,

    /// Endpoint receiving provisioning requests (required for "webhook")
    #[serde(default)]
    pub webhook_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_provisioning_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            provider: default_provisioning_provider(),
            webhook_url: String::new(),
            timeout_ms: default_provisioning_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_storage_path() -> String {
    "data/welcomarr.json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_lifetime_days() -> i64 {
    7
}
fn default_max_uses() -> i32 {
    1
}
fn default_provisioning_provider() -> String {
    "log".to_string()
}
fn default_provisioning_timeout_ms() -> u64 {
    5000
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with WELCOMARR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WELCOMARR").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the config directory.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30

            [storage]
            path = "data/welcomarr.json"

            [logging]
            level = "info"
            format = "json"

            [admin]
            username = "admin"
            initial_password = "admin"

            [invitations]
            default_lifetime_days = 7
            default_max_uses = 1

            [provisioning]
            provider = "log"
            webhook_url = ""
            timeout_ms = 5000

            [security]
            cors_origins = []
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can build partial configs.
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WELCOMARR__STORAGE__PATH must not be empty".to_string(),
            ));
        }

        if self.admin.username.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WELCOMARR__ADMIN__USERNAME must not be empty".to_string(),
            ));
        }

        // The initial password only seeds a store that does not exist yet.
        if self.admin.initial_password.is_empty() && !Path::new(&self.storage.path).exists() {
            return Err(ConfigValidationError::MissingRequired(
                "WELCOMARR__ADMIN__INITIAL_PASSWORD must be set before the store is created"
                    .to_string(),
            ));
        }

        let defaults = &self.invitations;
        if !(0..=MAX_LIFETIME_DAYS).contains(&defaults.default_lifetime_days) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "invitations.default_lifetime_days must be between 0 and {}",
                MAX_LIFETIME_DAYS
            )));
        }
        if !(1..=MAX_USES_LIMIT).contains(&defaults.default_max_uses) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "invitations.default_max_uses must be between 1 and {}",
                MAX_USES_LIMIT
            )));
        }

        match self.provisioning.provider.as_str() {
            "log" => {}
            "webhook" => {
                if self.provisioning.webhook_url.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "provisioning.webhook_url is required for the webhook provider"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown provisioning provider '{}'",
                    other
                )));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.path, "data/welcomarr.json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.invitations.default_lifetime_days, 7);
        assert_eq!(config.invitations.default_max_uses, 1);
        assert_eq!(config.provisioning.provider, "log");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_env_override() {
        let config = Config::load_for_test(&[
            ("server.port", "9000"),
            ("logging.level", "debug"),
            ("invitations.default_max_uses", "5"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.invitations.default_max_uses, 5);
    }

    #[test]
    fn test_config_validation_missing_admin_password() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("welcomarr.json");
        let config = Config::load_for_test(&[
            ("storage.path", path.to_str().unwrap()),
            ("admin.initial_password", ""),
        ])
        .expect("Failed to load config");
        let result = config.validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("WELCOMARR__ADMIN__INITIAL_PASSWORD"));
    }

    #[test]
    fn test_config_validation_existing_store_needs_no_initial_password() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("welcomarr.json");
        std::fs::write(&path, "{}").unwrap();

        let config = Config::load_for_test(&[
            ("storage.path", path.to_str().unwrap()),
            ("admin.initial_password", ""),
        ])
        .expect("Failed to load config");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_webhook_requires_url() {
        let config = Config::load_for_test(&[("provisioning.provider", "webhook")])
            .expect("Failed to load config");
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("webhook_url"));

        let config = Config::load_for_test(&[
            ("provisioning.provider", "webhook"),
            ("provisioning.webhook_url", "http://media.local/hooks/provision"),
        ])
        .expect("Failed to load config");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_unknown_provider() {
        let config = Config::load_for_test(&[("provisioning.provider", "carrier-pigeon")])
            .expect("Failed to load config");
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_config_validation_invitation_defaults() {
        let config = Config::load_for_test(&[("invitations.default_max_uses", "0")])
            .expect("Failed to load config");
        assert!(config.validate().is_err());

        let too_long = (MAX_LIFETIME_DAYS + 1).to_string();
        let config =
            Config::load_for_test(&[("invitations.default_lifetime_days", too_long.as_str())])
                .expect("Failed to load config");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(&MAX_LIFETIME_DAYS.to_string()));

        let limit = MAX_USES_LIMIT.to_string();
        let config = Config::load_for_test(&[("invitations.default_max_uses", limit.as_str())])
            .expect("Failed to load config");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[("server.host", "127.0.0.1"), ("server.port", "3000")])
            .expect("Failed to load config");

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}
