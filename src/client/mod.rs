//! Client Module
//!
//! Client-side orchestration over the HTTP API: a [`Fetcher`] boundary, a
//! per-endpoint [`CollectionHook`] backed by a client TTL cache, and a
//! [`MultiCollection`] aggregator.

mod fetcher;
mod hook;
mod multi;

pub use fetcher::{unwrap_envelope, Fetcher, HttpFetcher};
pub use hook::{
    collection_name, CollectionHook, ErrorObserver, HookOptions, HookSnapshot, Phase, Transform,
};
pub use multi::{EndpointSpec, MultiCollection};
