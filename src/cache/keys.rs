//! Cache key conventions for collection data.
//!
//! The cache does not know about collections. Read and write paths build
//! keys through these helpers so invalidation hits the same strings the
//! readers populated.

/// Last segment of the listing key.
pub const LISTING_SEGMENT: &str = "all";

/// Key of a collection's full listing: `collection:<name>:all`.
pub fn collection_all(collection: &str) -> String {
    format!("collection:{collection}:{LISTING_SEGMENT}")
}

/// Key of a single document: `collection:<name>:<id>`.
///
/// `None` for an id whose key would be the listing key; such documents are
/// never cached on their own.
pub fn collection_item(collection: &str, id: &str) -> Option<String> {
    (id != LISTING_SEGMENT).then(|| format!("collection:{collection}:{id}"))
}

/// Prefix covering every key of a collection.
pub fn collection_prefix(collection: &str) -> String {
    format!("collection:{collection}:")
}
