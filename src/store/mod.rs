//! Store Module
//!
//! The document store is an external collaborator. Read and write paths talk
//! to it only through [`DocumentStore`]; drivers are adapted to that trait and
//! handed to a [`StoreContext`].

mod connection;
mod memory;

pub use connection::{ConnectionOptions, StoreContext, StoreFactory};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document as returned by the store, before normalization.
pub type RawDocument = Map<String, Value>;

// == Filter ==
/// The only two queries this layer issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every document in the collection
    All,
    /// Documents whose application `id` field equals the value
    ById(String),
}

impl Filter {
    /// Whether `doc` satisfies the filter.
    pub fn matches(&self, doc: &RawDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::ById(id) => doc.get("id").and_then(Value::as_str) == Some(id.as_str()),
        }
    }
}

// == Write Outcomes ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Identifier the store assigned to the new document
    pub generated_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

// == Document Store ==
/// CRUD capability over named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(&self, collection: &str, filter: &Filter)
        -> Result<Vec<RawDocument>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<RawDocument>, StoreError>;

    async fn insert_one(
        &self,
        collection: &str,
        doc: RawDocument,
    ) -> Result<InsertOutcome, StoreError>;

    /// Replaces the first document matching `filter` with `doc`.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        doc: RawDocument,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn delete_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_by_id_uses_application_id() {
        let filter = Filter::ById("7".into());

        assert!(filter.matches(&doc(json!({"id": "7", "_id": "abc"}))));
        assert!(!filter.matches(&doc(json!({"_id": "7"}))));
        assert!(!filter.matches(&doc(json!({"id": 7}))));
        assert!(Filter::All.matches(&doc(json!({}))));
    }
}
