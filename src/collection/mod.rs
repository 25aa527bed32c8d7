//! Collection Module
//!
//! Cached read path and invalidating write path for one named collection.
//!
//! Cache keys follow [`crate::cache::keys`]: the full listing lives under
//! `collection:<name>:all`, single documents under `collection:<name>:<id>`.

mod document;
mod hooks;
mod read;
mod write;

pub use document::{from_value, normalize, to_value, Document, INTERNAL_ID};
pub use hooks::{CollectionHooks, NoHooks};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{TtlCache, SERVER_DEFAULT_TTL};
use crate::schema::Validator;
use crate::standardize::{entity_type, Standardizer};
use crate::store::StoreContext;

// == Read Results ==
/// Data together with whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub data: T,
    pub cached: bool,
}

impl<T> Fetched<T> {
    pub fn cached(data: T) -> Self {
        Self { data, cached: true }
    }

    pub fn fresh(data: T) -> Self {
        Self {
            data,
            cached: false,
        }
    }
}

/// Options for the read path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Skip the cache read. The result is still written to the cache.
    pub force: bool,
}

impl ReadOptions {
    pub fn force() -> Self {
        Self { force: true }
    }
}

// == Collection Config ==
/// How a collection is read, validated and cached.
#[derive(Clone)]
pub struct CollectionConfig {
    pub name: String,
    /// TTL of cached results
    pub ttl: Duration,
    pub validator: Option<Arc<dyn Validator>>,
    pub standardizer: Option<Arc<dyn Standardizer>>,
    pub hooks: Arc<dyn CollectionHooks>,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: SERVER_DEFAULT_TTL,
            validator: None,
            standardizer: None,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_standardizer(mut self, standardizer: Arc<dyn Standardizer>) -> Self {
        self.standardizer = Some(standardizer);
        self
    }

    pub fn with_hooks(mut self, hooks: impl CollectionHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }
}

impl fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("validator", &self.validator.is_some())
            .field("standardizer", &self.standardizer.is_some())
            .finish_non_exhaustive()
    }
}

// == Collection ==
/// One collection bound to a store context and a cache.
pub struct Collection {
    name: String,
    entity_type: String,
    ttl: Duration,
    validator: Option<Arc<dyn Validator>>,
    standardizer: Option<Arc<dyn Standardizer>>,
    hooks: Arc<dyn CollectionHooks>,
    store: Arc<StoreContext>,
    cache: Arc<TtlCache<Value>>,
}

impl Collection {
    pub fn new(config: CollectionConfig, store: Arc<StoreContext>, cache: Arc<TtlCache<Value>>) -> Self {
        Self {
            entity_type: entity_type(&config.name),
            name: config.name,
            ttl: config.ttl,
            validator: config.validator,
            standardizer: config.standardizer,
            hooks: config.hooks,
            store,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag used to select standardization rules.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache(&self) -> &Arc<TtlCache<Value>> {
        &self.cache
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// == Registry ==
/// Collections served by one process, sharing a store context and a cache.
#[derive(Debug, Clone)]
pub struct Collections {
    store: Arc<StoreContext>,
    cache: Arc<TtlCache<Value>>,
    by_name: HashMap<String, Arc<Collection>>,
}

impl Collections {
    pub fn new(store: Arc<StoreContext>, cache: Arc<TtlCache<Value>>) -> Self {
        Self {
            store,
            cache,
            by_name: HashMap::new(),
        }
    }

    /// Registers a collection, replacing any previous one with that name.
    pub fn register(&mut self, config: CollectionConfig) -> Arc<Collection> {
        let collection = Arc::new(Collection::new(
            config,
            self.store.clone(),
            self.cache.clone(),
        ));
        self.by_name
            .insert(collection.name().to_string(), collection.clone());
        collection
    }

    pub fn with(mut self, config: CollectionConfig) -> Self {
        self.register(config);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<Collection>> {
        self.by_name.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn store(&self) -> &Arc<StoreContext> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<TtlCache<Value>> {
        &self.cache
    }
}
