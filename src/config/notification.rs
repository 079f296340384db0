//! Notification configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Delivery service URL. Unset means notifications are only logged.
    pub endpoint: Option<String>,

    /// Recipient of operator alerts
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Base URL for links placed in customer messages
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Delivery request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ValidationError::InvalidNotificationEndpoint);
            }
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidNotificationTimeout);
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            admin_email: default_admin_email(),
            app_url: default_app_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_admin_email() -> String {
    "alerts@pixelperfectgraphix.com".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    5
}
