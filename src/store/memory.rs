//! In-memory document store.
//!
//! Backs `memory://` connection strings and the test suites. Documents keep
//! insertion order per collection and receive a UUID in `_id` on insert.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DeleteOutcome, DocumentStore, Filter, InsertOutcome, RawDocument, UpdateOutcome};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<RawDocument>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts documents directly, bypassing the trait. Documents without an
    /// `_id` get one assigned.
    pub async fn seed(&self, collection: &str, docs: impl IntoIterator<Item = RawDocument>) {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        for mut doc in docs {
            doc.entry("_id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            target.push(doc);
        }
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<RawDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut doc: RawDocument,
    ) -> Result<InsertOutcome, StoreError> {
        let generated_id = Uuid::new_v4().to_string();
        doc.insert("_id".to_string(), Value::String(generated_id.clone()));

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);

        Ok(InsertOutcome { generated_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut doc: RawDocument,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(existing) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(UpdateOutcome { matched_count: 0 });
        };

        // Replacement keeps the store-assigned identifier.
        if let Some(internal_id) = existing.get("_id").cloned() {
            doc.insert("_id".to_string(), internal_id);
        }
        *existing = doc;

        Ok(UpdateOutcome { matched_count: 1 })
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteOutcome { deleted_count: 0 });
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteOutcome { deleted_count: 1 })
            }
            None => Ok(DeleteOutcome { deleted_count: 0 }),
        }
    }
}
