//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum webhook endpoint
//! - `memory` - In-memory subscription store
//! - `notification` - HTTP and logging notifiers

pub mod http;
pub mod memory;
pub mod notification;

pub use http::{webhook_router, WebhookAppState};
pub use memory::InMemorySubscriptionStore;
pub use notification::{HttpNotifier, HttpNotifierConfig, LoggingNotifier};
