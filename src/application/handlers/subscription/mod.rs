//! Subscription webhook handlers.
//!
//! - `HandleSubscriptionWebhookHandler` - Verify, dispatch, acknowledge
//! - `SubscriptionLifecycle` - One handler per subscription event
//! - `ErrorReporter` - Operator alerts for failed deliveries

mod error_reporter;
mod handle_webhook;
mod lifecycle;

pub use error_reporter::{ErrorReport, ErrorReporter, RequestMetadata};
pub use handle_webhook::{
    HandleSubscriptionWebhookCommand, HandleSubscriptionWebhookHandler, ProcessedWebhook,
};
pub use lifecycle::{SubscriptionLifecycle, GRACE_PERIOD_DAYS};
