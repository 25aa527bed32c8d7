//! Response DTOs for the HTTP API
//!
//! Every collection endpoint answers with the same envelope:
//! `{ "success": true, "data": ..., "cached": bool }` on success and
//! `{ "success": false, "error": "..." }` on failure.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::collection::Fetched;

/// Success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
    /// Whether `data` was served from the server cache
    pub cached: bool,
}

impl<T> DataResponse<T> {
    pub fn fresh(data: T) -> Self {
        Self {
            success: true,
            data,
            cached: false,
        }
    }
}

impl<T> From<Fetched<T>> for DataResponse<T> {
    fn from(fetched: Fetched<T>) -> Self {
        Self {
            success: true,
            data: fetched.data,
            cached: fetched.cached,
        }
    }
}

/// Failure envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

impl DeletedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: true,
        }
    }
}

/// Response body of `GET /cache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshotResponse {
    /// Physically present entries, including not yet evicted stale ones
    pub size: usize,
    pub keys: Vec<String>,
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl CacheSnapshotResponse {
    pub fn new(keys: Vec<String>, stats: CacheStats) -> Self {
        Self {
            size: keys.len(),
            hit_rate: stats.hit_rate(),
            keys,
            stats,
        }
    }
}

/// Response body of `GET /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeyResponse {
    pub key: String,
    pub present: bool,
    /// Milliseconds until expiry, absent when the key is not live
    pub ttl_remaining_ms: Option<u64>,
}

/// Response body of `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Registered collection names
    pub collections: Vec<String>,
}

impl HealthResponse {
    pub fn healthy(collections: Vec<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            collections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_response_from_fetched() {
        let resp = DataResponse::from(Fetched::cached(json!([1, 2])));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"success": true, "data": [1, 2], "cached": true}));
    }

    #[test]
    fn test_error_response_serialize() {
        let value = serde_json::to_value(ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Something went wrong"}));
    }

    #[test]
    fn test_cache_snapshot_counts_keys() {
        let resp = CacheSnapshotResponse::new(vec!["a".into(), "b".into()], CacheStats::new());
        assert_eq!(resp.size, 2);
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy(vec!["items".into()])).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("items"));
    }
}
