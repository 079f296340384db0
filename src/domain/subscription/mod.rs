//! Subscription domain module.
//!
//! Models the provider's subscription lifecycle as seen through signed
//! webhook notifications.
//!
//! # Module Structure
//!
//! - `amount` - Minor-unit currency amounts
//! - `event` - Inbound notification envelope, typed entities and event kinds
//! - `status` - SubscriptionStatus state machine
//! - `dispatch_result` - Per-event handler result returned to the provider
//! - `plan` - Plan catalogue for notification content
//! - `webhook_verifier` - HMAC-SHA256 signature check
//! - `webhook_errors` - Error taxonomy with HTTP mapping

mod amount;
mod dispatch_result;
mod event;
mod plan;
mod status;
mod webhook_errors;
mod webhook_verifier;

pub use amount::{Amount, MINOR_UNITS_PER_MAJOR};
pub use dispatch_result::{DispatchDetails, DispatchResult, DispatchStatus};
pub use event::{
    EntityWrapper, EventKind, InboundNotification, NotificationPayload, PaymentEntity,
    SubscriptionEntity,
};
pub use plan::{plan_name, templates_count, Plan};
pub use status::SubscriptionStatus;
pub use webhook_errors::{HandlerError, WebhookError};
pub use webhook_verifier::{compute_signature, WebhookVerifier};
