//! HTTP notifier - Posts notifications as JSON to a delivery service.
//!
//! The delivery service owns templates and addresses; this adapter only
//! forwards the template name, recipient and data. Operator alerts carry the
//! configured admin address in `to`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::ports::{Notification, NotificationDeliveryError, Notifier, Recipient};

/// Configuration for [`HttpNotifier`].
#[derive(Debug, Clone)]
pub struct HttpNotifierConfig {
    /// URL notifications are POSTed to.
    pub endpoint: String,

    /// Recipient address for operator alerts.
    pub admin_email: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// JSON body sent to the delivery service.
#[derive(Serialize)]
struct OutboundMessage<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
}

/// Notifier backed by an HTTP delivery service.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    config: HttpNotifierConfig,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(config: HttpNotifierConfig) -> Result<Self, NotificationDeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationDeliveryError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationDeliveryError> {
        let to = match notification.recipient {
            Recipient::Operator => Some(self.config.admin_email.as_str()),
            Recipient::Customer { .. } => None,
        };
        let body = OutboundMessage {
            notification: &notification,
            to,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationDeliveryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status,
                error = %error_text,
                template = notification.template.as_str(),
                "Notification endpoint rejected message"
            );
            return Err(NotificationDeliveryError::Rejected { status });
        }

        tracing::debug!(
            template = notification.template.as_str(),
            "Notification delivered"
        );
        Ok(())
    }
}
