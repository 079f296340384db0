//! Notifier port - Fire-and-forget delivery of templated messages.
//!
//! Customer emails and operator alerts both go through this port. Callers
//! never let a delivery failure change the webhook response: errors are
//! logged and dropped.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Message templates the webhook handlers send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    SubscriptionAuthenticated,
    SubscriptionActivated,
    PaymentSuccess,
    SubscriptionPaused,
    SubscriptionResumed,
    PaymentRetry,
    SubscriptionHalted,
    SubscriptionCancelled,
    SubscriptionCompleted,
    SubscriptionUpdated,
    /// Operator alert carrying an error report.
    WebhookError,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::SubscriptionAuthenticated => "subscription_authenticated",
            NotificationTemplate::SubscriptionActivated => "subscription_activated",
            NotificationTemplate::PaymentSuccess => "payment_success",
            NotificationTemplate::SubscriptionPaused => "subscription_paused",
            NotificationTemplate::SubscriptionResumed => "subscription_resumed",
            NotificationTemplate::PaymentRetry => "payment_retry",
            NotificationTemplate::SubscriptionHalted => "subscription_halted",
            NotificationTemplate::SubscriptionCancelled => "subscription_cancelled",
            NotificationTemplate::SubscriptionCompleted => "subscription_completed",
            NotificationTemplate::SubscriptionUpdated => "subscription_updated",
            NotificationTemplate::WebhookError => "webhook_error",
        }
    }
}

/// Who the message is for.
///
/// Customers are identified by provider ids; resolving them to an address is
/// the notifier's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recipient {
    Customer {
        customer_id: Option<String>,
        subscription_id: String,
    },
    Operator,
}

/// A templated message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: Recipient,
    pub data: serde_json::Value,
}

impl Notification {
    pub fn to_customer(
        template: NotificationTemplate,
        customer_id: Option<&str>,
        subscription_id: &str,
        data: serde_json::Value,
    ) -> Self {
        Self {
            template,
            recipient: Recipient::Customer {
                customer_id: customer_id.map(str::to_string),
                subscription_id: subscription_id.to_string(),
            },
            data,
        }
    }

    pub fn to_operator(template: NotificationTemplate, data: serde_json::Value) -> Self {
        Self {
            template,
            recipient: Recipient::Operator,
            data,
        }
    }
}

/// Delivery failures. Never surfaced to the webhook caller.
#[derive(Debug, Error)]
pub enum NotificationDeliveryError {
    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },
}

/// Port for sending notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationDeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_notification_serializes_with_tagged_recipient() {
        let notification = Notification::to_customer(
            NotificationTemplate::PaymentSuccess,
            Some("cust_1"),
            "sub_1",
            json!({"amount": "₹49"}),
        );

        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(
            value,
            json!({
                "template": "payment_success",
                "recipient": {"type": "customer", "customer_id": "cust_1", "subscription_id": "sub_1"},
                "data": {"amount": "₹49"}
            })
        );
    }

    #[test]
    fn operator_notification_serializes() {
        let notification =
            Notification::to_operator(NotificationTemplate::WebhookError, json!({}));

        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(value["recipient"], json!({"type": "operator"}));
        assert_eq!(value["template"], "webhook_error");
    }

    #[test]
    fn template_as_str_matches_serde_name() {
        for template in [
            NotificationTemplate::SubscriptionAuthenticated,
            NotificationTemplate::PaymentRetry,
            NotificationTemplate::WebhookError,
        ] {
            assert_eq!(serde_json::to_value(template).unwrap(), json!(template.as_str()));
        }
    }

    #[test]
    fn delivery_errors_display() {
        assert_eq!(
            NotificationDeliveryError::Rejected { status: 502 }.to_string(),
            "Notification rejected with status 502"
        );
    }
}
