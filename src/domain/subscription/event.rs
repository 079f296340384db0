//! Inbound subscription notification types.
//!
//! The envelope is decoded first with the payload left as raw JSON. Typed
//! entities are decoded only once the event is known to be one we handle, so
//! an unfamiliar event never fails on a payload shape we do not model.
//! Only fields relevant to our processing are captured; anything else the
//! provider sends is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::Timestamp;

use super::amount::Amount;
use super::status::SubscriptionStatus;

/// Webhook envelope as delivered by the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundNotification {
    /// Event name, e.g. `subscription.charged`.
    pub event: String,

    /// Resources affected by the event, undecoded.
    #[serde(default)]
    pub payload: Value,

    /// When the provider created the event (Unix seconds).
    #[serde(default)]
    pub created_at: Value,
}

impl InboundNotification {
    /// Parses the event name into a known kind.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event)
    }

    /// Id of a payload resource, read without decoding the rest.
    pub fn entity_id(&self, resource: &str) -> Option<&str> {
        self.payload
            .get(resource)?
            .get("entity")?
            .get("id")?
            .as_str()
    }

    /// Provider creation time, when present and representable.
    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at.as_i64().and_then(Timestamp::from_unix_secs)
    }

    /// Decodes the payload into typed entities.
    ///
    /// An absent payload decodes to an empty one.
    pub fn decode_payload(&self) -> Result<NotificationPayload, serde_json::Error> {
        if self.payload.is_null() {
            return Ok(NotificationPayload::default());
        }
        NotificationPayload::deserialize(&self.payload)
    }
}

/// Mapping of resource name to wrapped entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub subscription: Option<EntityWrapper<SubscriptionEntity>>,

    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
}

impl NotificationPayload {
    /// The subscription entity, if the payload carries one.
    pub fn subscription(&self) -> Option<&SubscriptionEntity> {
        self.subscription.as_ref().map(|w| &w.entity)
    }

    /// The payment entity, if the payload carries one.
    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payment.as_ref().map(|w| &w.entity)
    }
}

/// The provider nests each resource under an `entity` key.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

/// Subscription resource as reported by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionEntity {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Next charge (or retry) time.
    #[serde(default)]
    pub charge_at: Option<i64>,
    #[serde(default)]
    pub current_start: Option<i64>,
    #[serde(default)]
    pub current_end: Option<i64>,
    /// When access ends after a cancellation.
    #[serde(default)]
    pub end_at: Option<i64>,
    #[serde(default)]
    pub paid_count: Option<u32>,
    #[serde(default)]
    pub remaining_count: Option<u32>,
}

impl SubscriptionEntity {
    pub fn charge_at(&self) -> Option<Timestamp> {
        self.charge_at.and_then(Timestamp::from_unix_secs)
    }

    pub fn current_start(&self) -> Option<Timestamp> {
        self.current_start.and_then(Timestamp::from_unix_secs)
    }

    pub fn current_end(&self) -> Option<Timestamp> {
        self.current_end.and_then(Timestamp::from_unix_secs)
    }

    pub fn end_at(&self) -> Option<Timestamp> {
        self.end_at.and_then(Timestamp::from_unix_secs)
    }
}

/// Payment resource as reported by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    /// Amount in minor units.
    pub amount: Amount,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl PaymentEntity {
    pub fn paid_at(&self) -> Option<Timestamp> {
        self.created_at.and_then(Timestamp::from_unix_secs)
    }
}

/// The subscription lifecycle events this service handles.
///
/// Any other event name is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Mandate set up, first charge scheduled.
    Authenticated,
    /// First payment succeeded.
    Activated,
    /// Recurring payment succeeded.
    Charged,
    Paused,
    Resumed,
    /// Payment failed, provider retrying.
    Pending,
    /// Retries exhausted.
    Halted,
    Cancelled,
    /// All billing cycles finished.
    Completed,
    /// Plan or quantity changed.
    Updated,
}

impl EventKind {
    /// Every recognised kind, in lifecycle order.
    pub const ALL: [EventKind; 10] = [
        EventKind::Authenticated,
        EventKind::Activated,
        EventKind::Charged,
        EventKind::Paused,
        EventKind::Resumed,
        EventKind::Pending,
        EventKind::Halted,
        EventKind::Cancelled,
        EventKind::Completed,
        EventKind::Updated,
    ];

    /// Parse an event name. Returns `None` for names we do not handle.
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "subscription.authenticated" => Self::Authenticated,
            "subscription.activated" => Self::Activated,
            "subscription.charged" => Self::Charged,
            "subscription.paused" => Self::Paused,
            "subscription.resumed" => Self::Resumed,
            "subscription.pending" => Self::Pending,
            "subscription.halted" => Self::Halted,
            "subscription.cancelled" => Self::Cancelled,
            "subscription.completed" => Self::Completed,
            "subscription.updated" => Self::Updated,
            _ => return None,
        };
        Some(kind)
    }

    /// Provider event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "subscription.authenticated",
            Self::Activated => "subscription.activated",
            Self::Charged => "subscription.charged",
            Self::Paused => "subscription.paused",
            Self::Resumed => "subscription.resumed",
            Self::Pending => "subscription.pending",
            Self::Halted => "subscription.halted",
            Self::Cancelled => "subscription.cancelled",
            Self::Completed => "subscription.completed",
            Self::Updated => "subscription.updated",
        }
    }

    /// Status the subscription is in once this event has been applied.
    pub fn resulting_status(&self) -> SubscriptionStatus {
        match self {
            Self::Authenticated => SubscriptionStatus::Authenticated,
            Self::Activated | Self::Charged | Self::Resumed | Self::Updated => {
                SubscriptionStatus::Active
            }
            Self::Paused => SubscriptionStatus::Paused,
            Self::Pending => SubscriptionStatus::Pending,
            Self::Halted => SubscriptionStatus::Halted,
            Self::Cancelled => SubscriptionStatus::Cancelled,
            Self::Completed => SubscriptionStatus::Completed,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
