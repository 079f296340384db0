//! Response DTOs for the subscription webhook endpoint.

use serde::Serialize;

use crate::application::ProcessedWebhook;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::DispatchResult;

/// Value of `status` in every acknowledgement.
pub const PROCESSED: &str = "processed";

/// Body returned with 200 for a verified delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAcknowledgement {
    pub received: bool,
    /// Event name, echoed exactly as delivered.
    pub event: String,
    pub status: &'static str,
    pub timestamp: Timestamp,
    pub result: DispatchResult,
}

impl From<ProcessedWebhook> for WebhookAcknowledgement {
    fn from(processed: ProcessedWebhook) -> Self {
        Self {
            received: true,
            event: processed.event,
            status: PROCESSED,
            timestamp: processed.processed_at,
            result: processed.result,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            timestamp: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Body for `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub webhook_secret_configured: bool,
}
