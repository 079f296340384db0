//! Notification adapters.
//!
//! - **HttpNotifier** - POSTs JSON to a delivery service
//! - **LoggingNotifier** - Logs messages (no endpoint configured)

mod http_notifier;
mod logging_notifier;

pub use http_notifier::{HttpNotifier, HttpNotifierConfig};
pub use logging_notifier::LoggingNotifier;
