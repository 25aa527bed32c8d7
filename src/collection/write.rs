//! Write path: transform, validate, write, then invalidate.
//!
//! Cache entries are deleted only after the store acknowledged the write.
//! A failed or unmatched write leaves the cache untouched.

use serde_json::Value;
use tracing::debug;

use super::{Collection, Document, INTERNAL_ID};
use crate::cache::keys;
use crate::error::Result;
use crate::schema::ValidationError;
use crate::store::Filter;

impl Collection {
    // == Create ==
    /// Validates and inserts `payload`, returning the stored document
    /// annotated with its store-assigned `_id`.
    ///
    /// Invalidates the collection listing.
    pub async fn create(&self, payload: Value) -> Result<Document> {
        let payload = self.hooks.before_write(payload).await?;
        let mut doc = self.validate(payload)?;

        let store = self.store.database().await?;
        let outcome = store.insert_one(&self.name, doc.clone()).await?;
        self.invalidate_listing();

        doc.insert(INTERNAL_ID.to_string(), Value::String(outcome.generated_id));
        self.hooks.after_write(doc).await
    }

    // == Update ==
    /// Replaces the document whose application `id` matches.
    ///
    /// `id` is merged into the payload before validation and overrides any
    /// `id` the payload carries. Returns `None` when nothing matched.
    pub async fn update(&self, id: &str, payload: Value) -> Result<Option<Document>> {
        let payload = match self.hooks.before_write(payload).await? {
            Value::Object(mut fields) => {
                fields.insert("id".to_string(), Value::String(id.to_string()));
                Value::Object(fields)
            }
            other => other,
        };
        let doc = self.validate(payload)?;

        let store = self.store.database().await?;
        let outcome = store
            .update_one(&self.name, &Filter::ById(id.to_string()), doc.clone())
            .await?;
        if outcome.matched_count == 0 {
            debug!(collection = %self.name, id, "update matched nothing");
            return Ok(None);
        }

        self.invalidate_document(id);
        self.hooks.after_write(doc).await.map(Some)
    }

    // == Remove ==
    /// Deletes the document whose application `id` matches.
    ///
    /// Returns `false` when nothing matched.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let store = self.store.database().await?;
        let outcome = store
            .delete_one(&self.name, &Filter::ById(id.to_string()))
            .await?;
        if outcome.deleted_count == 0 {
            debug!(collection = %self.name, id, "delete matched nothing");
            return Ok(false);
        }

        self.invalidate_document(id);
        Ok(true)
    }

    // == Invalidation ==
    /// Drops every cached entry of this collection.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_all(&self) -> usize {
        let removed = self
            .cache
            .delete_by_prefix(&keys::collection_prefix(&self.name));
        debug!(collection = %self.name, removed, "collection cache dropped");
        removed
    }

    fn invalidate_listing(&self) {
        self.cache.delete(&keys::collection_all(&self.name));
        debug!(collection = %self.name, "listing invalidated");
    }

    fn invalidate_document(&self, id: &str) {
        self.cache.delete(&keys::collection_all(&self.name));
        if let Some(key) = keys::collection_item(&self.name, id) {
            self.cache.delete(&key);
        }
        debug!(collection = %self.name, id, "listing and document invalidated");
    }

    fn validate(&self, payload: Value) -> Result<Document> {
        let validated = match &self.validator {
            Some(validator) => validator.validate(payload)?,
            None => payload,
        };

        match validated {
            Value::Object(doc) => Ok(doc),
            _ => Err(ValidationError::message("expected a JSON object").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::collection::test_support::Fixture;
    use crate::collection::{CollectionConfig, CollectionHooks, ReadOptions};
    use crate::error::{ServiceError, StoreError};
    use crate::schema::{FieldKind, FieldSchema};
    use crate::store::{
        ConnectionOptions, DeleteOutcome, DocumentStore, InsertOutcome, RawDocument, StoreContext,
        UpdateOutcome,
    };

    fn item_schema() -> FieldSchema {
        FieldSchema::new()
            .required("id", FieldKind::String)
            .required("title", FieldKind::String)
    }

    /// Store that rejects every write.
    struct ReadOnlyStore;

    #[async_trait]
    impl DocumentStore for ReadOnlyStore {
        async fn find_all(&self, _: &str, _: &Filter) -> std::result::Result<Vec<RawDocument>, StoreError> {
            Ok(Vec::new())
        }

        async fn find_one(&self, _: &str, _: &Filter) -> std::result::Result<Option<RawDocument>, StoreError> {
            Ok(None)
        }

        async fn insert_one(&self, _: &str, _: RawDocument) -> std::result::Result<InsertOutcome, StoreError> {
            Err(StoreError::Operation("read-only".into()))
        }

        async fn update_one(
            &self,
            _: &str,
            _: &Filter,
            _: RawDocument,
        ) -> std::result::Result<UpdateOutcome, StoreError> {
            Err(StoreError::Operation("read-only".into()))
        }

        async fn delete_one(&self, _: &str, _: &Filter) -> std::result::Result<DeleteOutcome, StoreError> {
            Err(StoreError::Operation("read-only".into()))
        }
    }

    struct Stamp;

    #[async_trait]
    impl CollectionHooks for Stamp {
        async fn before_write(&self, mut payload: Value) -> Result<Value> {
            let title = payload["title"].as_str().unwrap_or("untitled").to_uppercase();
            payload["title"] = json!(title);
            Ok(payload)
        }

        async fn after_write(&self, mut doc: Document) -> Result<Document> {
            doc.insert("stamped".into(), json!(true));
            Ok(doc)
        }
    }

    #[tokio::test]
    async fn test_create_invalidates_listing() {
        let fixture = Fixture::new();
        fixture
            .seed("items", json!([{"id": "1", "title": "A"}, {"id": "2", "title": "B"}]))
            .await;
        let items = fixture.collection(CollectionConfig::new("items").with_validator(item_schema()));

        items.list_all(ReadOptions::default()).await.unwrap();
        let created = items.create(json!({"id": "3", "title": "C"})).await.unwrap();
        assert!(created.get("_id").and_then(Value::as_str).is_some());
        assert!(!fixture.cache.has("collection:items:all"));

        let listing = items.list_all(ReadOptions::default()).await.unwrap();
        assert!(!listing.cached);
        assert_eq!(listing.data.len(), 3);
    }

    #[tokio::test]
    async fn test_create_validation_failure_touches_nothing() {
        let fixture = Fixture::new();
        let items = fixture.collection(CollectionConfig::new("items").with_validator(item_schema()));
        fixture.cache.set_default("collection:items:all", json!([]));

        let err = items.create(json!({"id": "3"})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(fixture.store.count("items").await, 0);
        assert!(fixture.cache.has("collection:items:all"));
        assert!(!fixture.context.is_connected().await);
    }

    #[tokio::test]
    async fn test_non_object_payload_rejected_without_schema() {
        let fixture = Fixture::new();
        let items = fixture.collection(CollectionConfig::new("items"));

        let err = items.create(json!("just a string")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_id_and_invalidates() {
        let fixture = Fixture::new();
        fixture.seed("items", json!([{"id": "1", "title": "A"}])).await;
        let items = fixture.collection(CollectionConfig::new("items").with_validator(item_schema()));

        items.list_all(ReadOptions::default()).await.unwrap();
        items.get_by_id("1", ReadOptions::default()).await.unwrap();

        // No id in the payload: the schema still passes because the target id is merged in.
        let updated = items.update("1", json!({"title": "A2"})).await.unwrap().unwrap();
        assert_eq!(updated["id"], "1");
        assert!(!fixture.cache.has("collection:items:all"));
        assert!(!fixture.cache.has("collection:items:1"));

        let listing = items.list_all(ReadOptions::default()).await.unwrap();
        assert!(!listing.cached);
        assert_eq!(listing.data[0]["title"], "A2");
    }

    #[tokio::test]
    async fn test_update_missing_leaves_cache() {
        let fixture = Fixture::new();
        let items = fixture.collection(CollectionConfig::new("items"));
        fixture.cache.set_default("collection:items:all", json!([]));
        fixture.cache.set_default("collection:items:missing-id", json!({}));

        let outcome = items
            .update("missing-id", json!({"title": "X"}))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(fixture.store.count("items").await, 0);
        assert!(fixture.cache.has("collection:items:all"));
        assert!(fixture.cache.has("collection:items:missing-id"));
    }

    #[tokio::test]
    async fn test_remove_found_and_missing() {
        let fixture = Fixture::new();
        fixture.seed("items", json!([{"id": "1"}])).await;
        let items = fixture.collection(CollectionConfig::new("items"));
        fixture.cache.set_default("collection:items:all", json!([]));
        fixture.cache.set_default("collection:items:1", json!({}));

        assert!(!items.remove("2").await.unwrap());
        assert_eq!(fixture.cache.size(), 2);

        assert!(items.remove("1").await.unwrap());
        assert!(fixture.cache.is_empty());
        assert!(!items.remove("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_does_not_invalidate() {
        let fixture = Fixture::new();
        let context = Arc::new(
            StoreContext::configure(ConnectionOptions::handle(Arc::new(ReadOnlyStore))).unwrap(),
        );
        let items = Collection::new(
            CollectionConfig::new("items"),
            context,
            fixture.cache.clone(),
        );
        fixture.cache.set_default("collection:items:all", json!([{"id": "1"}]));
        fixture.cache.set_default("collection:items:1", json!({"id": "1"}));

        assert!(items.create(json!({"id": "2"})).await.is_err());
        assert!(items.update("1", json!({})).await.is_err());
        assert!(items.remove("1").await.is_err());

        assert!(fixture.cache.has("collection:items:all"));
        assert!(fixture.cache.has("collection:items:1"));
    }

    #[tokio::test]
    async fn test_write_hooks_applied() {
        let fixture = Fixture::new();
        let items = fixture.collection(CollectionConfig::new("items").with_hooks(Stamp));

        let created = items.create(json!({"id": "1", "title": "draft"})).await.unwrap();
        assert_eq!(created["title"], "DRAFT");
        assert_eq!(created["stamped"], true);

        let stored = fixture
            .store
            .find_one("items", &Filter::ById("1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["title"], "DRAFT");
        assert!(stored.get("stamped").is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_drops_collection_keys_only() {
        let fixture = Fixture::new();
        let items = fixture.collection(CollectionConfig::new("items"));
        fixture.cache.set_default("collection:items:all", json!([]));
        fixture.cache.set_default("collection:items:1", json!({}));
        fixture.cache.set_default("collection:services:all", json!([]));

        assert_eq!(items.invalidate_all(), 2);
        assert_eq!(fixture.cache.keys(), vec!["collection:services:all"]);
    }
}
