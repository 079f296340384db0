//! Subscription status state machine.
//!
//! Mirrors the provider's subscription lifecycle as observed through
//! webhook events.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription status as tracked by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Mandate authorised, waiting for the first charge.
    Authenticated,

    /// Paid and current.
    Active,

    /// Paused by the customer. Data is kept, access suspended.
    Paused,

    /// A charge failed and the provider is retrying.
    Pending,

    /// Retries exhausted. Access continues only for the grace period.
    Halted,

    /// Cancelled. Access continues until the provider's `end_at`.
    Cancelled,

    /// Every billing cycle has been charged.
    Completed,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to premium features.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::Pending
                | SubscriptionStatus::Halted
                | SubscriptionStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Authenticated => "authenticated",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Halted => "halted",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Completed => "completed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        let status = match s {
            "authenticated" => SubscriptionStatus::Authenticated,
            "active" => SubscriptionStatus::Active,
            "paused" => SubscriptionStatus::Paused,
            "pending" => SubscriptionStatus::Pending,
            "halted" => SubscriptionStatus::Halted,
            "cancelled" => SubscriptionStatus::Cancelled,
            "completed" => SubscriptionStatus::Completed,
            _ => return None,
        };
        Some(status)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From AUTHENTICATED
            (Authenticated, Active)
            // From ACTIVE
                | (Active, Active) // Charged / updated
                | (Active, Paused)
                | (Active, Pending)
                | (Active, Cancelled)
                | (Active, Completed)
            // From PAUSED
                | (Paused, Active)
            // From PENDING
                | (Pending, Active) // Retry succeeded
                | (Pending, Halted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Authenticated => vec![Active],
            Active => vec![Active, Paused, Pending, Cancelled, Completed],
            Paused => vec![Active],
            Pending => vec![Active, Halted],
            Halted | Cancelled | Completed => vec![],
        }
    }
}
