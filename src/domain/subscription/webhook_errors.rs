//! Webhook error types for subscription webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors raised by an individual lifecycle handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload lacks an entity this event requires.
    #[error("Missing entity: {0}")]
    MissingEntity(&'static str),

    /// A recognised event carried entities we could not decode.
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// The subscription store rejected a read or write.
    #[error("Store error: {0}")]
    Store(#[from] DomainError),
}

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No shared secret is configured, so nothing can be verified.
    #[error("Webhook secret not configured")]
    MissingSecret,

    /// Signature header missing, malformed, or not matching the body.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Body passed verification but is not a notification we can decode.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// A lifecycle handler failed.
    #[error("Handler for {event} failed: {source}")]
    Handler {
        event: String,
        #[source]
        source: HandlerError,
    },

    /// Dispatch did not finish within the configured bound.
    #[error("Handler for {event} timed out after {after_secs}s")]
    Timeout { event: String, after_secs: u64 },
}

impl WebhookError {
    /// Wraps a handler failure with the event it was processing.
    pub fn handler(event: impl Into<String>, source: HandlerError) -> Self {
        WebhookError::Handler {
            event: event.into(),
            source,
        }
    }

    /// Returns true if the provider should redeliver this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed
    /// on subsequent attempts (store outages, slow collaborators, a secret
    /// that is about to be configured).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSecret
                | WebhookError::Timeout { .. }
                | WebhookError::Handler {
                    source: HandlerError::Store(_),
                    ..
                }
        )
    }

    /// Returns true if the operator channel should hear about this error.
    ///
    /// Caller and configuration faults are only logged.
    pub fn reports_to_operator(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidPayload(_)
                | WebhookError::Handler { .. }
                | WebhookError::Timeout { .. }
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine the provider's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::MissingSecret
            | WebhookError::Handler { .. }
            | WebhookError::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
