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
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid signature header name: {0}")]
    InvalidSignatureHeader(String),

    #[error("Body size limit must be greater than zero")]
    InvalidBodyLimit,

    #[error("Dispatch timeout must be greater than zero")]
    InvalidDispatchTimeout,

    #[error("Notification endpoint must be an http(s) URL")]
    InvalidNotificationEndpoint,

    #[error("Notification timeout must be greater than zero")]
    InvalidNotificationTimeout,
}
