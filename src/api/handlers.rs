//! API Handlers
//!
//! HTTP request handlers for the collection CRUD endpoints and the cache
//! inspection surface.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{duration_ms, TtlCache};
use crate::collection::{Collection, Collections, Document};
use crate::config::Config;
use crate::error::{ConfigError, Result, ServiceError};
use crate::models::{
    CacheClearResponse, CacheKeyResponse, CacheSnapshotResponse, ClearQuery, DataResponse,
    DeletedResponse, HealthResponse, ReadQuery,
};
use crate::store::StoreContext;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub collections: Arc<Collections>,
}

impl AppState {
    pub fn new(collections: Collections) -> Self {
        Self {
            collections: Arc::new(collections),
        }
    }

    /// Builds the store context, the shared cache and every configured
    /// collection. Does not connect to the store.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let store = Arc::new(StoreContext::configure(config.connection_options())?);
        let cache = Arc::new(TtlCache::new(config.cache_ttl()));

        let collections = config
            .collection_configs()
            .into_iter()
            .fold(Collections::new(store, cache), Collections::with);
        Ok(Self::new(collections))
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .get(name)
            .ok_or_else(|| ServiceError::UnknownCollection(name.to_string()))
    }
}

fn json_body(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ServiceError::InvalidRequest(rejection.body_text()))
}

/// Handler for GET /api/:collection
pub async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<DataResponse<Vec<Document>>>> {
    let fetched = state.collection(&collection)?.list_all(query.into()).await?;
    Ok(Json(fetched.into()))
}

/// Handler for POST /api/:collection/refresh
///
/// Re-reads the listing from the store regardless of the cached entry.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<DataResponse<Vec<Document>>>> {
    let docs = state.collection(&collection)?.refresh_cache().await?;
    info!(collection = %collection, count = docs.len(), "cache refreshed on request");
    Ok(Json(DataResponse::fresh(docs)))
}

/// Handler for POST /api/:collection
pub async fn create_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Document>>)> {
    let target = state.collection(&collection)?;
    let doc = target.create(json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::fresh(doc))))
}

/// Handler for GET /api/:collection/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<DataResponse<Document>>> {
    state
        .collection(&collection)?
        .get_by_id(&id, query.into())
        .await?
        .map(|fetched| Json(fetched.into()))
        .ok_or_else(|| ServiceError::NotFound(format!("{collection}/{id}")))
}

/// Handler for PUT /api/:collection/:id
pub async fn update_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataResponse<Document>>> {
    let target = state.collection(&collection)?;
    target
        .update(&id, json_body(body)?)
        .await?
        .map(|doc| Json(DataResponse::fresh(doc)))
        .ok_or_else(|| ServiceError::NotFound(format!("{collection}/{id}")))
}

/// Handler for DELETE /api/:collection/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<DataResponse<DeletedResponse>>> {
    if state.collection(&collection)?.remove(&id).await? {
        Ok(Json(DataResponse::fresh(DeletedResponse::new(id))))
    } else {
        Err(ServiceError::NotFound(format!("{collection}/{id}")))
    }
}

/// Handler for GET /cache
pub async fn cache_snapshot_handler(State(state): State<AppState>) -> Json<CacheSnapshotResponse> {
    let cache = state.collections.cache();
    Json(CacheSnapshotResponse::new(cache.keys(), cache.stats()))
}

/// Handler for GET /cache/:key
pub async fn cache_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<CacheKeyResponse> {
    let cache = state.collections.cache();
    let present = cache.has(&key);
    let ttl_remaining_ms = cache.ttl_remaining(&key).map(duration_ms);
    Json(CacheKeyResponse {
        key,
        present,
        ttl_remaining_ms,
    })
}

/// Handler for DELETE /cache[?prefix=...]
pub async fn cache_clear_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<CacheClearResponse>> {
    if let Some(message) = query.validate() {
        return Err(ServiceError::InvalidRequest(message));
    }

    let cache = state.collections.cache();
    let removed = match query.prefix.as_deref() {
        Some(prefix) => cache.delete_by_prefix(prefix),
        None => {
            let removed = cache.size();
            cache.clear();
            removed
        }
    };
    info!(removed, prefix = ?query.prefix, "cache cleared on request");

    Ok(Json(CacheClearResponse { removed }))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.collections.names()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionConfig;
    use crate::store::ConnectionOptions;
    use serde_json::json;
    use std::time::Duration;

    fn test_state() -> AppState {
        let store = StoreContext::configure(ConnectionOptions::uri("memory://test")).unwrap();
        let cache = TtlCache::new(Duration::from_secs(300));
        AppState::new(
            Collections::new(Arc::new(store), Arc::new(cache)).with(CollectionConfig::new("items")),
        )
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let state = test_state();

        let (status, created) = create_handler(
            State(state.clone()),
            Path("items".to_string()),
            Ok(Json(json!({"id": "1", "title": "A"}))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.data["id"], "1");

        let listed = list_handler(
            State(state.clone()),
            Path("items".to_string()),
            Query(ReadQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(listed.data.len(), 1);
        assert!(!listed.cached);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let result = list_handler(
            State(test_state()),
            Path("nope".to_string()),
            Query(ReadQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::UnknownCollection(_))));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let result = get_handler(
            State(test_state()),
            Path(("items".to_string(), "404".to_string())),
            Query(ReadQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cache_clear_by_prefix() {
        let state = test_state();
        let cache = state.collections.cache();
        cache.set_default("collection:items:all", json!([]));
        cache.set_default("other", json!(1));

        let response = cache_clear_handler(
            State(state.clone()),
            Query(ClearQuery {
                prefix: Some("collection:".into()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.removed, 1);
        assert_eq!(cache.keys(), vec!["other"]);
    }

    #[tokio::test]
    async fn test_cache_key_reports_remaining_ttl() {
        let clock = crate::cache::ManualClock::new(0);
        let cache = TtlCache::with_clock(Duration::from_secs(300), Arc::new(clock.clone()));
        let store = StoreContext::configure(ConnectionOptions::uri("memory://test")).unwrap();
        let state = AppState::new(Collections::new(Arc::new(store), Arc::new(cache)));
        state
            .collections
            .cache()
            .set("collection:items:all", json!([]), Duration::from_secs(10));

        clock.advance(Duration::from_secs(4));
        let live = cache_key_handler(State(state.clone()), Path("collection:items:all".into())).await;
        assert!(live.present);
        assert_eq!(live.ttl_remaining_ms, Some(6_000));

        clock.advance(Duration::from_secs(7));
        let gone = cache_key_handler(State(state), Path("collection:items:all".into())).await;
        assert!(!gone.present);
        assert_eq!(gone.ttl_remaining_ms, None);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            collections: vec!["services".into(), "caseStudies".into()],
            ..Config::default()
        };
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.collections.names(), vec!["caseStudies", "services"]);

        let bad = Config {
            database_url: "::not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            AppState::from_config(&bad),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_lists_collections() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.collections, vec!["items"]);
    }
}
