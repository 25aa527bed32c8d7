//! Per-collection transform hooks.

use async_trait::async_trait;
use serde_json::Value;

use super::Document;
use crate::error::Result;
use crate::store::Filter;

/// Optional transforms around store access. Every method defaults to the
/// identity, so implementors override only what they need.
///
/// An error from any hook aborts the operation; read hooks leave the cache
/// untouched.
#[async_trait]
pub trait CollectionHooks: Send + Sync {
    /// Runs before the store is queried.
    async fn before_read(&self, filter: Filter) -> Result<Filter> {
        Ok(filter)
    }

    /// Runs on normalized (and standardized) documents before caching.
    async fn after_read(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
        Ok(docs)
    }

    /// Runs on the raw payload before validation.
    async fn before_write(&self, payload: Value) -> Result<Value> {
        Ok(payload)
    }

    /// Runs on the written document before it is returned.
    async fn after_write(&self, doc: Document) -> Result<Document> {
        Ok(doc)
    }
}

/// Hooks that change nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl CollectionHooks for NoHooks {}
