//! Client orchestration hook.
//!
//! A [`CollectionHook`] binds one endpoint to the client cache and a
//! [`Fetcher`]. Its observable state is `(data, loading, error)`; `phase`
//! follows `Idle -> Loading -> Success | Error` and re-enters `Loading` on
//! every fetch.
//!
//! Responses are applied in the order they resolve. A response for an
//! endpoint the hook no longer points at is dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use super::Fetcher;
use crate::cache::{keys, TtlCache};
use crate::error::FetchError;
use crate::lock::mutex_lock;
use crate::standardize::{entity_type, Standardizer};

const SOURCE: &str = "client::hook";

/// Caller-supplied transform applied to fresh data before display and caching.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Receives refresh failures. Defaults to a `tracing` warning.
pub type ErrorObserver = Arc<dyn Fn(&str, &FetchError) + Send + Sync>;

// == Phase ==
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Nothing fetched yet; data is the initial data
    Idle,
    /// A fetch is in flight
    Loading,
    Success,
    Error(FetchError),
}

// == Options ==
#[derive(Clone, Default)]
pub struct HookOptions {
    /// Data displayed before anything is fetched
    pub initial_data: Option<Value>,
    /// Collection name used for client cache keys. Defaults to the last
    /// path segment of the endpoint.
    pub cache_name: Option<String>,
    /// TTL of client cache writes. Defaults to the cache's default TTL.
    pub ttl: Option<Duration>,
    pub standardizer: Option<Arc<dyn Standardizer>>,
    pub transform: Option<Transform>,
    pub on_error: Option<ErrorObserver>,
}

impl HookOptions {
    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = Some(name.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_standardizer(mut self, standardizer: Arc<dyn Standardizer>) -> Self {
        self.standardizer = Some(standardizer);
        self
    }

    pub fn with_transform(mut self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_error_observer(
        mut self,
        observer: impl Fn(&str, &FetchError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(observer));
        self
    }
}

impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("initial_data", &self.initial_data)
            .field("cache_name", &self.cache_name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// == Snapshot ==
/// What a UI renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct HookSnapshot {
    pub data: Option<Value>,
    /// A fetch or a refresh is in flight
    pub loading: bool,
    pub error: Option<FetchError>,
    pub is_refreshing: bool,
    pub phase: Phase,
}

#[derive(Debug)]
struct HookState {
    endpoint: String,
    data: Option<Value>,
    phase: Phase,
    /// Number of refreshes in flight
    refreshing: usize,
}

// == Collection Hook ==
pub struct CollectionHook {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<TtlCache<Value>>,
    options: HookOptions,
    state: Mutex<HookState>,
}

impl CollectionHook {
    /// Creates an idle hook. Nothing is fetched until [`mount`](Self::mount).
    pub fn new(
        endpoint: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<TtlCache<Value>>,
        options: HookOptions,
    ) -> Self {
        let state = HookState {
            endpoint: endpoint.into(),
            data: options.initial_data.clone(),
            phase: Phase::Idle,
            refreshing: 0,
        };
        Self {
            fetcher,
            cache,
            options,
            state: Mutex::new(state),
        }
    }

    // == Lifecycle ==
    /// Seeds data from a live client cache entry, then fetches.
    ///
    /// The cache check happens before the first suspension point, so cached
    /// data is visible while the fetch is in flight.
    pub async fn mount(&self) {
        let endpoint = {
            let mut state = self.lock("mount");
            let key = keys::collection_all(&self.cache_name(&state.endpoint));
            if let Some(cached) = self.cache.get(&key) {
                debug!(endpoint = %state.endpoint, "seeded from client cache");
                state.data = Some(cached);
            }
            state.phase = Phase::Loading;
            state.endpoint.clone()
        };

        self.load(endpoint).await;
    }

    /// Points the hook at another endpoint and mounts again. Does nothing if
    /// the endpoint is unchanged.
    pub async fn set_endpoint(&self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        {
            let mut state = self.lock("set_endpoint");
            if state.endpoint == endpoint {
                return;
            }
            state.endpoint = endpoint;
        }
        self.mount().await;
    }

    /// Fetches again through the cache-respecting read.
    pub async fn refetch(&self) {
        let endpoint = {
            let mut state = self.lock("refetch");
            state.phase = Phase::Loading;
            state.endpoint.clone()
        };

        self.load(endpoint).await;
    }

    /// Forces the server to re-read the store and displays the result.
    ///
    /// Never fails: errors go to the error observer and the displayed data
    /// and phase stay as they were.
    pub async fn refresh(&self) {
        let endpoint = {
            let mut state = self.lock("refresh");
            state.refreshing += 1;
            state.endpoint.clone()
        };

        let result = self.fetcher.post(&refresh_endpoint(&endpoint), None).await;

        let mut state = self.lock("refresh");
        state.refreshing -= 1;
        if state.endpoint != endpoint {
            return;
        }
        match result {
            Ok(data) => self.accept(&mut state, data),
            Err(err) => {
                drop(state);
                self.report(&endpoint, &err);
            }
        }
    }

    // == Mutations ==
    /// POSTs `payload` to the endpoint, then invalidates the client listing
    /// and refetches.
    pub async fn create(&self, payload: Value) -> Result<Value, FetchError> {
        let endpoint = self.endpoint();
        let created = self
            .fetcher
            .request(Method::POST, &endpoint, Some(payload))
            .await?;

        self.cache
            .delete(&keys::collection_all(&self.cache_name(&endpoint)));
        self.refetch().await;
        Ok(created)
    }

    /// PUTs `payload` to `<endpoint>/<id>`, then invalidates and refetches.
    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, FetchError> {
        let endpoint = self.endpoint();
        let updated = self
            .fetcher
            .request(Method::PUT, &item_endpoint(&endpoint, id), Some(payload))
            .await?;

        self.invalidate_item(&endpoint, id);
        self.refetch().await;
        Ok(updated)
    }

    /// DELETEs `<endpoint>/<id>`, then invalidates and refetches.
    pub async fn remove(&self, id: &str) -> Result<(), FetchError> {
        let endpoint = self.endpoint();
        self.fetcher
            .request(Method::DELETE, &item_endpoint(&endpoint, id), None)
            .await?;

        self.invalidate_item(&endpoint, id);
        self.refetch().await;
        Ok(())
    }

    // == Observation ==
    pub fn snapshot(&self) -> HookSnapshot {
        let state = self.lock("snapshot");
        let error = match &state.phase {
            Phase::Error(err) => Some(err.clone()),
            _ => None,
        };
        HookSnapshot {
            data: state.data.clone(),
            loading: state.phase == Phase::Loading || state.refreshing > 0,
            error,
            is_refreshing: state.refreshing > 0,
            phase: state.phase.clone(),
        }
    }

    pub fn data(&self) -> Option<Value> {
        self.lock("data").data.clone()
    }

    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    pub fn error(&self) -> Option<FetchError> {
        self.snapshot().error
    }

    pub fn endpoint(&self) -> String {
        self.lock("endpoint").endpoint.clone()
    }

    // == Internals ==
    async fn load(&self, endpoint: String) {
        let result = self.fetcher.get(&endpoint).await;

        let mut state = self.lock("load");
        if state.endpoint != endpoint {
            debug!(%endpoint, "dropping response for previous endpoint");
            return;
        }
        match result {
            Ok(data) => self.accept(&mut state, data),
            Err(err) => {
                debug!(%endpoint, error = %err, "fetch failed");
                state.phase = Phase::Error(err);
            }
        }
    }

    /// Standardize, transform, display and cache fresh data.
    fn accept(&self, state: &mut HookState, data: Value) {
        let name = self.cache_name(&state.endpoint);
        let data = match &self.options.standardizer {
            Some(standardizer) => standardizer.standardize_value(&entity_type(&name), data),
            None => data,
        };
        let data = match &self.options.transform {
            Some(transform) => transform(data),
            None => data,
        };

        let ttl = self.options.ttl.unwrap_or_else(|| self.cache.default_ttl());
        self.cache.set(keys::collection_all(&name), data.clone(), ttl);
        state.data = Some(data);
        state.phase = Phase::Success;
    }

    fn report(&self, endpoint: &str, err: &FetchError) {
        match &self.options.on_error {
            Some(observer) => observer(endpoint, err),
            None => warn!(%endpoint, error = %err, "refresh failed; keeping previous data"),
        }
    }

    fn invalidate_item(&self, endpoint: &str, id: &str) {
        let name = self.cache_name(endpoint);
        self.cache.delete(&keys::collection_all(&name));
        if let Some(key) = keys::collection_item(&name, id) {
            self.cache.delete(&key);
        }
    }

    fn cache_name(&self, endpoint: &str) -> String {
        self.options
            .cache_name
            .clone()
            .unwrap_or_else(|| collection_name(endpoint))
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, HookState> {
        mutex_lock(&self.state, SOURCE, op)
    }
}

impl fmt::Debug for CollectionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHook")
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

/// Last path segment of an endpoint, ignoring any query string.
pub fn collection_name(endpoint: &str) -> String {
    let path = endpoint.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn split_query(endpoint: &str) -> (&str, &str) {
    match endpoint.find('?') {
        Some(index) => endpoint.split_at(index),
        None => (endpoint, ""),
    }
}

fn refresh_endpoint(endpoint: &str) -> String {
    let (path, query) = split_query(endpoint);
    format!("{}/refresh{query}", path.trim_end_matches('/'))
}

fn item_endpoint(endpoint: &str, id: &str) -> String {
    let (path, _) = split_query(endpoint);
    format!("{}/{id}", path.trim_end_matches('/'))
}
