//! HandleSubscriptionWebhookHandler - Command handler for subscription webhooks.
//!
//! Verifies the delivery, dispatches it to the lifecycle handler for its
//! event, and reports failures to the operator.

use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{DispatchResult, WebhookError, WebhookVerifier};

use super::error_reporter::{ErrorReport, ErrorReporter, RequestMetadata};
use super::lifecycle::SubscriptionLifecycle;

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleSubscriptionWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header value, if present.
    pub signature: Option<String>,
    pub request: RequestMetadata,
}

/// A delivery that was verified and dispatched.
#[derive(Debug, Clone)]
pub struct ProcessedWebhook {
    /// Event name as delivered.
    pub event: String,
    pub result: DispatchResult,
    pub processed_at: Timestamp,
}

/// Handler for subscription webhook deliveries.
pub struct HandleSubscriptionWebhookHandler {
    verifier: WebhookVerifier,
    lifecycle: SubscriptionLifecycle,
    reporter: ErrorReporter,
    dispatch_timeout: Duration,
}

impl HandleSubscriptionWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        lifecycle: SubscriptionLifecycle,
        reporter: ErrorReporter,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            lifecycle,
            reporter,
            dispatch_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleSubscriptionWebhookCommand,
    ) -> Result<ProcessedWebhook, WebhookError> {
        match self.process(&cmd).await {
            Ok(processed) => Ok(processed),
            Err(error) => {
                if error.is_retryable() {
                    tracing::warn!(error = %error, "Webhook failed, provider will redeliver");
                } else {
                    tracing::error!(error = %error, "Webhook failed permanently");
                }
                if error.reports_to_operator() {
                    self.reporter
                        .report(ErrorReport::capture(&error, &cmd.payload, &cmd.request))
                        .await;
                }
                Err(error)
            }
        }
    }

    async fn process(
        &self,
        cmd: &HandleSubscriptionWebhookCommand,
    ) -> Result<ProcessedWebhook, WebhookError> {
        // 1. Verify signature, then decode the envelope
        let notification = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())?;

        tracing::info!(
            event = %notification.event,
            created_at = ?notification.created_at(),
            subscription_id = ?notification.entity_id("subscription"),
            "Processing webhook event"
        );

        // 2. Dispatch within the configured bound
        let result = match tokio::time::timeout(
            self.dispatch_timeout,
            self.lifecycle.dispatch(&notification),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(source)) => return Err(WebhookError::handler(&notification.event, source)),
            Err(_) => {
                return Err(WebhookError::Timeout {
                    event: notification.event.clone(),
                    after_secs: self.dispatch_timeout.as_secs(),
                })
            }
        };

        tracing::info!(
            event = %notification.event,
            status = ?result.status,
            "Webhook event processed"
        );

        Ok(ProcessedWebhook {
            event: notification.event,
            result,
            processed_at: Timestamp::now(),
        })
    }
}
