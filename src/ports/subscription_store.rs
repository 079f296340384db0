//! SubscriptionStore port - Interface for persisting subscription state.
//!
//! Every write is an upsert keyed by the provider-issued id, which is what
//! makes the lifecycle handlers safe to re-run.
//!
//! ## Why Idempotent Upserts Matter
//!
//! The provider delivers webhooks at least once. The same notification may
//! arrive again after:
//! - A network timeout on our acknowledgement
//! - A 5xx response from our endpoint (triggers retry)
//! - Our endpoint returning success but the provider not receiving it
//!
//! Applying the same fields twice must leave the store unchanged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::foundation::DomainError;

/// Field map written for one record.
pub type RecordFields = serde_json::Map<String, serde_json::Value>;

/// Kinds of records the webhook handlers maintain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Subscription,
    Payment,
    /// Access state per provider customer id.
    Customer,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Subscription => "subscription",
            RecordKind::Payment => "payment",
            RecordKind::Customer => "customer",
        }
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: RecordKind,

    /// Provider-issued id (sub_xxx, pay_xxx, cust_xxx).
    pub id: String,

    /// Merged field values.
    pub fields: RecordFields,

    /// Incremented on every change; starts at 1.
    pub version: u64,

    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Reads a string field.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed; one was created.
    Inserted,
    /// The record existed and at least one field changed.
    Updated,
    /// The record already held exactly these values.
    Unchanged,
}

impl UpsertOutcome {
    /// True when the write altered the store.
    pub fn changed(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

/// Port for subscription, payment and customer state.
///
/// Implementations must merge `fields` into any existing record (fields not
/// mentioned are kept) and serialize concurrent writes to the same id.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or merge a record keyed by `(kind, id)`.
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        fields: RecordFields,
    ) -> Result<UpsertOutcome, DomainError>;

    /// Fetch a record by key.
    ///
    /// Returns `None` if nothing has been written for it yet.
    async fn get(&self, kind: RecordKind, id: &str) -> Result<Option<StoredRecord>, DomainError>;
}
