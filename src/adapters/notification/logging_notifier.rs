//! Logging notifier - Writes notifications to the log instead of sending them.
//!
//! Used when no delivery endpoint is configured.

use async_trait::async_trait;

use crate::ports::{Notification, NotificationDeliveryError, Notifier, Recipient};

/// Notifier that only logs.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier {
    admin_email: Option<String>,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address operator alerts are logged against.
    pub fn with_admin_email(mut self, admin_email: impl Into<String>) -> Self {
        self.admin_email = Some(admin_email.into());
        self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationDeliveryError> {
        match &notification.recipient {
            Recipient::Customer {
                customer_id,
                subscription_id,
            } => tracing::info!(
                template = notification.template.as_str(),
                customer_id = ?customer_id,
                subscription_id = %subscription_id,
                data = %notification.data,
                "Customer notification"
            ),
            Recipient::Operator => tracing::warn!(
                template = notification.template.as_str(),
                to = ?self.admin_email,
                data = %notification.data,
                "Operator notification"
            ),
        }
        Ok(())
    }
}
