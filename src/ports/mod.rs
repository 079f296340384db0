//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - Idempotent upsert of subscription, payment and customer records
//! - `Notifier` - Fire-and-forget customer emails and operator alerts

mod notifier;
mod subscription_store;

pub use notifier::{
    Notification, NotificationDeliveryError, NotificationTemplate, Notifier, Recipient,
};
pub use subscription_store::{
    RecordFields, RecordKind, StoredRecord, SubscriptionStore, UpsertOutcome,
};
