//! HTTP adapter for the subscription webhook endpoint.
//!
//! - `POST /api/webhooks/subscription` - Verify and dispatch a delivery
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, HealthResponse, WebhookAcknowledgement};
pub use handlers::{WebhookApiError, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
