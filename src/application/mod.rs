//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    ErrorReport, ErrorReporter, HandleSubscriptionWebhookCommand,
    HandleSubscriptionWebhookHandler, ProcessedWebhook, RequestMetadata, SubscriptionLifecycle,
    GRACE_PERIOD_DAYS,
};
