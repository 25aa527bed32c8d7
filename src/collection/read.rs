//! Read path: cache check, store query, normalize, standardize, cache write.

use serde_json::Value;
use tracing::debug;

use super::{document, Collection, Document, Fetched, ReadOptions};
use crate::cache::keys;
use crate::error::Result;
use crate::store::{Filter, RawDocument};

impl Collection {
    // == List All ==
    /// Returns every document of the collection.
    ///
    /// A live cache entry is served without touching the store unless
    /// `options.force` is set. Fresh results are always written back to the
    /// cache with the collection TTL. On failure the cache is left as it was.
    pub async fn list_all(&self, options: ReadOptions) -> Result<Fetched<Vec<Document>>> {
        let key = keys::collection_all(&self.name);

        if !options.force {
            if let Some(docs) = self.cache.get(&key).and_then(document::from_value) {
                debug!(collection = %self.name, "serving listing from cache");
                return Ok(Fetched::cached(docs));
            }
        }

        let filter = self.hooks.before_read(Filter::All).await?;
        let store = self.store.database().await?;
        let raw = store.find_all(&self.name, &filter).await?;
        let docs = self.prepare(raw).await?;

        self.cache.set(key, document::to_value(&docs), self.ttl);
        debug!(collection = %self.name, count = docs.len(), force = options.force, "listing cached");
        Ok(Fetched::fresh(docs))
    }

    // == Get By Id ==
    /// Returns the document whose application `id` matches, or `None`.
    ///
    /// Misses are not cached, and neither is a document whose id would make
    /// its key the listing key.
    pub async fn get_by_id(&self, id: &str, options: ReadOptions) -> Result<Option<Fetched<Document>>> {
        let key = keys::collection_item(&self.name, id);

        if let (false, Some(key)) = (options.force, &key) {
            if let Some(Value::Object(cached)) = self.cache.get(key) {
                debug!(collection = %self.name, id, "serving document from cache");
                return Ok(Some(Fetched::cached(cached)));
            }
        }

        let filter = self.hooks.before_read(Filter::ById(id.to_string())).await?;
        let store = self.store.database().await?;
        let Some(raw) = store.find_one(&self.name, &filter).await? else {
            debug!(collection = %self.name, id, "document not found");
            return Ok(None);
        };

        let Some(doc) = self.prepare(vec![raw]).await?.into_iter().next() else {
            return Ok(None);
        };

        if let Some(key) = key {
            self.cache.set(key, Value::Object(doc.clone()), self.ttl);
        }
        Ok(Some(Fetched::fresh(doc)))
    }

    // == Refresh Cache ==
    /// Re-reads the full listing from the store and repopulates the cache,
    /// regardless of whether the cached entry is still live.
    pub async fn refresh_cache(&self) -> Result<Vec<Document>> {
        Ok(self.list_all(ReadOptions::force()).await?.data)
    }

    /// Normalize, standardize, then run the `after_read` hook.
    async fn prepare(&self, raw: Vec<RawDocument>) -> Result<Vec<Document>> {
        let docs = raw
            .into_iter()
            .map(document::normalize)
            .map(|doc| match &self.standardizer {
                Some(standardizer) => standardizer.standardize(&self.entity_type, doc),
                None => doc,
            })
            .collect();

        self.hooks.after_read(docs).await
    }
}
