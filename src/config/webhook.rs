//! Webhook ingress configuration

use axum::http::HeaderName;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// HMAC-SHA256 shared secret. Unset means every delivery is answered 500.
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Header carrying the hex signature
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Request body cap in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Upper bound on one dispatch, in seconds
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,
}

impl WebhookConfig {
    /// True when a non-empty secret is set.
    pub fn has_secret(&self) -> bool {
        self.secret
            .as_ref()
            .map(|s| !s.expose_secret().is_empty())
            .unwrap_or(false)
    }

    pub fn signature_header_name(&self) -> Result<HeaderName, ValidationError> {
        HeaderName::from_bytes(self.signature_header.as_bytes())
            .map_err(|_| ValidationError::InvalidSignatureHeader(self.signature_header.clone()))
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    /// Validate webhook configuration
    ///
    /// A missing secret is not an error here; the endpoint reports it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.signature_header_name()?;
        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }
        if self.dispatch_timeout_secs == 0 {
            return Err(ValidationError::InvalidDispatchTimeout);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: default_signature_header(),
            max_body_bytes: default_max_body_bytes(),
            dispatch_timeout_secs: default_dispatch_timeout(),
        }
    }
}

fn default_signature_header() -> String {
    "x-razorpay-signature".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_dispatch_timeout() -> u64 {
    10
}
