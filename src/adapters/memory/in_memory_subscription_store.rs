//! In-Memory Subscription Store Adapter
//!
//! Keeps subscription, payment and customer records in memory.
//! Used by the server binary until a database adapter exists, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{RecordFields, RecordKind, StoredRecord, SubscriptionStore, UpsertOutcome};

/// In-memory storage for subscription state.
///
/// The write lock is held for the whole merge, so concurrent upserts to the
/// same id are serialized.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<(RecordKind, String), StoredRecord>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records of one kind.
    pub async fn count(&self, kind: RecordKind) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        fields: RecordFields,
    ) -> Result<UpsertOutcome, DomainError> {
        let mut records = self.records.write().await;
        let key = (kind, id.to_string());

        let Some(record) = records.get_mut(&key) else {
            records.insert(
                key,
                StoredRecord {
                    kind,
                    id: id.to_string(),
                    fields,
                    version: 1,
                    updated_at: Utc::now(),
                },
            );
            return Ok(UpsertOutcome::Inserted);
        };

        let changed = fields
            .iter()
            .any(|(name, value)| record.fields.get(name) != Some(value));
        if !changed {
            return Ok(UpsertOutcome::Unchanged);
        }

        record.fields.extend(fields);
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(UpsertOutcome::Updated)
    }

    async fn get(&self, kind: RecordKind, id: &str) -> Result<Option<StoredRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(&(kind, id.to_string())).cloned())
    }
}
