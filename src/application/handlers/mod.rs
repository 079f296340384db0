//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    ErrorReport, ErrorReporter, HandleSubscriptionWebhookCommand,
    HandleSubscriptionWebhookHandler, ProcessedWebhook, RequestMetadata, SubscriptionLifecycle,
    GRACE_PERIOD_DAYS,
};
