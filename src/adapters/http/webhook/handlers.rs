//! HTTP handlers for the subscription webhook endpoint.
//!
//! These handlers connect Axum routes to the webhook command handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Json, State};
use axum::http::{HeaderMap, HeaderName};
use axum::response::IntoResponse;

use crate::application::{
    ErrorReporter, HandleSubscriptionWebhookCommand, HandleSubscriptionWebhookHandler,
    RequestMetadata, SubscriptionLifecycle,
};
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{WebhookError, WebhookVerifier};
use crate::ports::{Notifier, SubscriptionStore};

use super::dto::{ErrorResponse, HealthResponse, WebhookAcknowledgement};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct WebhookAppState {
    pub store: Arc<dyn SubscriptionStore>,
    pub notifier: Arc<dyn Notifier>,
    pub verifier: WebhookVerifier,
    pub signature_header: HeaderName,
    pub dispatch_timeout: Duration,
    /// Base URL for links in customer notifications.
    pub app_url: String,
}

impl WebhookAppState {
    pub fn webhook_handler(&self) -> HandleSubscriptionWebhookHandler {
        HandleSubscriptionWebhookHandler::new(
            self.verifier.clone(),
            SubscriptionLifecycle::new(
                self.store.clone(),
                self.notifier.clone(),
                self.app_url.clone(),
            ),
            ErrorReporter::new(self.notifier.clone()),
            self.dispatch_timeout,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/subscription - Handle subscription webhook deliveries
pub async fn handle_subscription_webhook(
    State(state): State<WebhookAppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(&state.signature_header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleSubscriptionWebhookCommand {
        payload: body.to_vec(),
        signature,
        request: request_metadata(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    };

    let processed = state.webhook_handler().handle(cmd).await?;

    Ok(Json(WebhookAcknowledgement::from(processed)))
}

/// GET /health - Liveness probe
pub async fn health(State(state): State<WebhookAppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        webhook_secret_configured: state.verifier.is_configured(),
    })
}

/// Caller details for error reports.
///
/// The first `x-forwarded-for` hop wins over the socket address.
fn request_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    RequestMetadata {
        user_agent: header("user-agent").map(str::to_string),
        ip_address: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
///
/// Internal error text is never included in 5xx bodies.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let body = match &self.0 {
            WebhookError::InvalidSignature => ErrorResponse::new("Invalid webhook signature"),
            WebhookError::MissingSecret => ErrorResponse::new("Webhook secret not configured")
                .with_message("Signature verification is unavailable"),
            WebhookError::InvalidPayload(detail) => {
                ErrorResponse::new("Invalid webhook payload").with_message(detail.clone())
            }
            WebhookError::Handler { .. } | WebhookError::Timeout { .. } => {
                ErrorResponse::new("Internal server error")
                    .with_message("Webhook processing failed")
                    .with_timestamp(Timestamp::now())
            }
        };

        (self.0.status_code(), Json(body)).into_response()
    }
}
