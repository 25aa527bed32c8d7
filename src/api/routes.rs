//! API Routes
//!
//! Configures the Axum router with the collection and cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_key_handler, cache_snapshot_handler, create_handler,
    delete_handler, get_handler, health_handler, list_handler, refresh_handler, update_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/:collection` - List documents (`?force=true` skips the cache read)
/// - `POST /api/:collection` - Create a document
/// - `POST /api/:collection/refresh` - Re-read the listing into the cache
/// - `GET /api/:collection/:id` - Get one document
/// - `PUT /api/:collection/:id` - Replace one document
/// - `DELETE /api/:collection/:id` - Delete one document
/// - `GET /cache`, `GET /cache/:key`, `DELETE /cache` - Cache inspection
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/:collection", get(list_handler).post(create_handler))
        .route("/api/:collection/refresh", post(refresh_handler))
        .route(
            "/api/:collection/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route(
            "/cache",
            get(cache_snapshot_handler).delete(cache_clear_handler),
        )
        .route("/cache/:key", get(cache_key_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::collection::{CollectionConfig, Collections};
    use crate::store::{ConnectionOptions, StoreContext};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store = StoreContext::configure(ConnectionOptions::uri("memory://routes")).unwrap();
        let collections = Collections::new(
            Arc::new(store),
            Arc::new(TtlCache::new(Duration::from_secs(300))),
        )
        .with(CollectionConfig::new("items"));
        create_router(AppState::new(collections))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_route_is_not_an_id() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/items/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/items")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_collection_not_found() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/api/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
