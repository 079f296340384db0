//! Axum router configuration for the subscription webhook endpoint.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers::{handle_subscription_webhook, health, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /subscription` - Handle subscription webhooks (signature verified)
///
/// Other methods on the route get 405 from the router. Bodies larger than
/// `max_body_bytes` get 413.
pub fn webhook_routes(max_body_bytes: usize) -> Router<WebhookAppState> {
    Router::new()
        .route("/subscription", post(handle_subscription_webhook))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

/// Create the complete application router.
///
/// # Example
///
/// ```ignore
/// let app = webhook_router(config.webhook.max_body_bytes).with_state(app_state);
/// ```
pub fn webhook_router(max_body_bytes: usize) -> Router<WebhookAppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes(max_body_bytes))
}
