//! Result of dispatching one notification to its lifecycle handler.
//!
//! Serialized into the `result` field of the acknowledgement envelope, so the
//! JSON shape here is part of the HTTP contract.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::amount::Amount;

/// Whether the event was acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Success,
    Ignored,
}

/// Outcome of a single handler run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    pub message: String,
    #[serde(flatten)]
    pub details: DispatchDetails,
}

/// Event-specific fields, flattened next to `status` and `message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchDetails {
    Authenticated {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_charge: Option<Timestamp>,
    },
    Activated {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        plan_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        period_end: Option<Timestamp>,
    },
    Charged {
        payment_id: String,
        subscription_id: String,
        /// Serialized in major units.
        amount: Amount,
        #[serde(skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_charge: Option<Timestamp>,
        /// True when this payment had already been recorded by an earlier delivery.
        already_recorded: bool,
    },
    Paused {
        subscription_id: String,
    },
    Resumed {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_charge: Option<Timestamp>,
    },
    Pending {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_retry: Option<Timestamp>,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_attempts: Option<u32>,
    },
    Halted {
        subscription_id: String,
        grace_period_days: i64,
        grace_period_ends: Timestamp,
    },
    Cancelled {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        access_until: Option<Timestamp>,
    },
    Completed {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_payments: Option<u32>,
    },
    Updated {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_plan: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        quantity: Option<u32>,
    },
    Ignored {
        event_type: String,
    },
}

impl DispatchResult {
    /// A handler ran and applied the event.
    pub fn success(message: impl Into<String>, details: DispatchDetails) -> Self {
        Self {
            status: DispatchStatus::Success,
            message: message.into(),
            details,
        }
    }

    /// The event name is not one we handle; acknowledge it anyway.
    pub fn ignored(event: impl Into<String>) -> Self {
        let event = event.into();
        Self {
            status: DispatchStatus::Ignored,
            message: format!("Event {} received but not handled", event),
            details: DispatchDetails::Ignored { event_type: event },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DispatchStatus::Success
    }
}
