//! docbind - cached CRUD endpoints over a document store
//!
//! Binds named collections of a document store to HTTP endpoints with a
//! process-wide TTL cache in front of reads, and provides the client-side
//! orchestration (per-endpoint hooks with their own TTL cache) that consumes
//! those endpoints.

pub mod api;
pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod standardize;
pub mod store;

mod lock;

pub use api::{create_router, AppState};
pub use cache::TtlCache;
pub use collection::{Collection, CollectionConfig, Collections};
pub use config::Config;
pub use error::{ConfigError, FetchError, ServiceError, StoreError};
pub use store::{ConnectionOptions, DocumentStore, MemoryStore, StoreContext};
