//! ErrorReporter - Operator alerts for failed webhook deliveries.

use std::error::Error;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::Timestamp;
use crate::ports::{Notification, NotificationTemplate, Notifier};

/// Placeholder for values the request did not carry.
const NOT_AVAILABLE: &str = "N/A";

/// Details about the HTTP request, captured by the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// What the operator receives when a delivery fails.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub report_id: Uuid,
    pub message: String,
    /// The error followed by its source chain, one cause per line.
    pub stack: String,
    pub timestamp: Timestamp,
    pub webhook_event: String,
    pub subscription_id: String,
    pub payment_id: String,
    pub user_agent: String,
    pub ip_address: String,
}

impl ErrorReport {
    /// Build a report from an error and the raw request body.
    ///
    /// The body is read loosely so a report can still name the event when the
    /// payload failed strict decoding.
    pub fn capture(
        error: &(dyn Error + 'static),
        payload: &[u8],
        request: &RequestMetadata,
    ) -> Self {
        let body: Value = serde_json::from_slice(payload).unwrap_or(Value::Null);
        let entity_id = |entity: &str| {
            body.pointer(&format!("/payload/{}/entity/id", entity))
                .and_then(Value::as_str)
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };

        Self {
            report_id: Uuid::new_v4(),
            message: error.to_string(),
            stack: render_chain(error),
            timestamp: Timestamp::now(),
            webhook_event: body
                .get("event")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            subscription_id: entity_id("subscription"),
            payment_id: entity_id("payment"),
            user_agent: request
                .user_agent
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ip_address: request
                .ip_address
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

fn render_chain(error: &(dyn Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

/// Sends [`ErrorReport`]s to the operator.
///
/// Reporting never fails the caller: a delivery error is logged and dropped.
#[derive(Clone)]
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
}

impl ErrorReporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn report(&self, report: ErrorReport) {
        tracing::error!(
            report_id = %report.report_id,
            webhook_event = %report.webhook_event,
            subscription_id = %report.subscription_id,
            payment_id = %report.payment_id,
            error = %report.message,
            "Webhook processing failed"
        );

        let data = match serde_json::to_value(&report) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize error report");
                return;
            }
        };

        match self
            .notifier
            .send(Notification::to_operator(NotificationTemplate::WebhookError, data))
            .await
        {
            Ok(()) => tracing::info!(report_id = %report.report_id, "Error notification sent"),
            Err(e) => tracing::error!(
                report_id = %report.report_id,
                error = %e,
                "Failed to send error notification"
            ),
        }
    }
}
