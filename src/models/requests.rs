//! Request DTOs for the HTTP API
//!
//! Query strings accepted by the collection and cache endpoints. Write
//! bodies are free-form JSON documents and need no DTO.

use serde::Deserialize;

use crate::collection::ReadOptions;

/// Query string of the read endpoints (`?force=true` bypasses the cache read)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub force: bool,
}

impl From<ReadQuery> for ReadOptions {
    fn from(query: ReadQuery) -> Self {
        ReadOptions { force: query.force }
    }
}

/// Query string of `DELETE /cache`
///
/// Without a prefix the whole cache is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ClearQuery {
    /// Rejects an empty prefix, which would silently clear everything.
    pub fn validate(&self) -> Option<String> {
        match self.prefix.as_deref() {
            Some("") => Some("Prefix cannot be empty; omit it to clear the cache".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_query_defaults_to_cached() {
        let query: ReadQuery = serde_json::from_str("{}").unwrap();
        assert!(!ReadOptions::from(query).force);
    }

    #[test]
    fn test_read_query_force() {
        let query: ReadQuery = serde_json::from_str(r#"{"force": true}"#).unwrap();
        assert!(ReadOptions::from(query).force);
    }

    #[test]
    fn test_clear_query_validate() {
        assert!(ClearQuery { prefix: None }.validate().is_none());
        assert!(ClearQuery {
            prefix: Some("collection:items:".into())
        }
        .validate()
        .is_none());
        assert!(ClearQuery {
            prefix: Some(String::new())
        }
        .validate()
        .is_some());
    }
}
