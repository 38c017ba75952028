//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Bot token must look like <bot id>:<secret>")]
    InvalidBotToken,

    #[error("Bot API base URL must be http(s)")]
    InvalidApiBaseUrl,

    #[error("Webhook secret must be 1-256 characters of A-Z, a-z, 0-9, _ or -")]
    InvalidWebhookSecret,

    #[error("Webhook secret is required in production")]
    WebhookSecretRequired,

    #[error("At least one admin user id must be configured")]
    NoAdminsConfigured,

    #[error("Transaction timeout must be between 1 and 60000 ms")]
    InvalidTransactionTimeout,
}
