use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Main configuration structure, injected at client construction
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub credentials: Credentials,
    /// QR terminal identifier assigned by the gateway (id_qr)
    pub qr_id: String,
    /// Merchant member identifier; falls back to the application id when absent
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// OAuth client credentials. Wiped from memory on drop; Debug is redacted.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Fixed gateway endpoints; defaults are the production URLs
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_token_url")]
    pub token: String,
    #[serde(default = "default_create_url")]
    pub create: String,
    #[serde(default = "default_status_url")]
    pub status: String,
    #[serde(default = "default_revoke_url")]
    pub revoke: String,
    #[serde(default = "default_cancel_url")]
    pub cancel: String,
    #[serde(default = "default_registry_url")]
    pub registry: String,
}

fn default_token_url() -> String {
    "https://api.sberbank.ru/ru/prod/tokens/v2/oauth".to_string()
}

fn default_create_url() -> String {
    "https://api.sberbank.ru/prod/qr/order/v3/creation".to_string()
}

fn default_status_url() -> String {
    "https://api.sberbank.ru/prod/qr/order/v3/status".to_string()
}

fn default_revoke_url() -> String {
    "https://api.sberbank.ru/prod/qr/order/v3/revocation".to_string()
}

fn default_cancel_url() -> String {
    "https://api.sberbank.ru/prod/qr/order/v3/cancel".to_string()
}

fn default_registry_url() -> String {
    "https://api.sberbank.ru/prod/qr/order/v3/registry".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: default_token_url(),
            create: default_create_url(),
            status: default_status_url(),
            revoke: default_revoke_url(),
            cancel: default_cancel_url(),
            registry: default_registry_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum attempts for idempotent reads (status/registry)
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u8 {
    3
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Seconds subtracted from a token's advertised validity window before
    /// it is considered expired
    #[serde(default = "default_token_safety_margin_secs")]
    pub token_safety_margin_secs: u64,
}

fn default_token_safety_margin_secs() -> u64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_safety_margin_secs: default_token_safety_margin_secs(),
        }
    }
}

impl AuthConfig {
    pub fn token_safety_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_safety_margin_secs as i64)
    }
}

const PLACEHOLDER_VALUES: &[&str] = &["xxxx", "changeme", "your-client-id", "your-client-secret"];

fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed.to_ascii_lowercase().as_str())
}

impl GatewayConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SBERQR_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SBERQR_CREDENTIALS__CLIENT_ID, etc.)
            .add_source(
                Environment::with_prefix("SBERQR")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values. The original implementation shipped
    /// with placeholder credentials baked into the service; those must be
    /// caught at startup, not at the first gateway call.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if is_placeholder(&self.credentials.client_id) {
            errors.push("credentials.client_id is empty or a placeholder".to_string());
        }
        if is_placeholder(&self.credentials.client_secret) {
            errors.push("credentials.client_secret is empty or a placeholder".to_string());
        }
        if is_placeholder(&self.qr_id) {
            errors.push("qr_id is empty or a placeholder".to_string());
        }

        for (name, value) in [
            ("endpoints.token", &self.endpoints.token),
            ("endpoints.create", &self.endpoints.create),
            ("endpoints.status", &self.endpoints.status),
            ("endpoints.revoke", &self.endpoints.revoke),
            ("endpoints.cancel", &self.endpoints.cancel),
            ("endpoints.registry", &self.endpoints.registry),
        ] {
            if Url::parse(value).is_err() {
                errors.push(format!("{name} is not a valid URL: {value}"));
            }
        }

        if self.http.connect_timeout_ms == 0 {
            errors.push("http.connect_timeout_ms must be positive".to_string());
        }
        if self.http.request_timeout_ms == 0 {
            errors.push("http.request_timeout_ms must be positive".to_string());
        }
        if self.http.max_retries == 0 {
            errors.push("http.max_retries must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        GatewayConfig {
            credentials: Credentials {
                client_id: "merchant-1".to_string(),
                client_secret: "s3cret".to_string(),
            },
            qr_id: "TERMINAL-42".to_string(),
            member_id: None,
            endpoints: Endpoints::default(),
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    #[test]
    fn default_endpoints_point_at_production() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.token,
            "https://api.sberbank.ru/ru/prod/tokens/v2/oauth"
        );
        assert_eq!(
            endpoints.create,
            "https://api.sberbank.ru/prod/qr/order/v3/creation"
        );
        assert_eq!(
            endpoints.revoke,
            "https://api.sberbank.ru/prod/qr/order/v3/revocation"
        );
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn placeholder_credentials_fail_fast() {
        let mut config = valid_config();
        config.credentials.client_id = "xxxx".to_string();
        config.credentials.client_secret = "  ".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("client_id"));
        assert!(errors[1].contains("client_secret"));
    }

    #[test]
    fn invalid_endpoint_url_is_rejected() {
        let mut config = valid_config();
        config.endpoints.status = "not a url".to_string();

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("endpoints.status")));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = valid_config();
        config.http.connect_timeout_ms = 0;
        config.http.max_retries = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = valid_config();
        let rendered = format!("{:?}", config.credentials);
        assert!(rendered.contains("merchant-1"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn default_timeouts_match_gateway_expectations() {
        let http = HttpConfig::default();
        assert_eq!(http.connect_timeout(), std::time::Duration::from_secs(3));
        assert_eq!(http.request_timeout(), std::time::Duration::from_secs(30));
    }
}
