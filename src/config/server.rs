//! HTTP listener settings.

use secrecy::SecretString;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

/// `STOREFRONT__SERVER__*`. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,

    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub log_level: String,

    /// Per-request timeout in seconds, 1-300
    pub request_timeout_secs: u64,

    /// Token for `/orders/:id/review-request`; the route answers 403 when unset
    pub internal_api_token: Option<SecretString>,
}

/// Deployment environment. Production switches logs to JSON and requires a
/// webhook secret.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::default(),
            log_level: "info,storefront_approvals=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            internal_api_token: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=300).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_in_development() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert!(!config.is_production());
        assert!(config.internal_api_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            (ServerConfig { port: 0, ..Default::default() }, ValidationError::InvalidPort),
            (
                ServerConfig { request_timeout_secs: 0, ..Default::default() },
                ValidationError::InvalidTimeout,
            ),
            (
                ServerConfig { request_timeout_secs: 301, ..Default::default() },
                ValidationError::InvalidTimeout,
            ),
            (
                ServerConfig { host: "not a host".into(), ..Default::default() },
                ValidationError::InvalidBindAddress("not a host:8080".into()),
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn environment_names_are_lowercase() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
        assert!(serde_json::from_str::<Environment>("\"Production\"").is_err());
    }
}
