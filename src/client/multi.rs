//! Multi-collection aggregator.
//!
//! Runs one [`CollectionHook`] per named endpoint and combines their state.
//! Declaration order is preserved and decides which error is reported.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use super::{CollectionHook, Fetcher, HookOptions, HookSnapshot};
use crate::cache::TtlCache;
use crate::error::FetchError;

/// One entry of a [`MultiCollection`].
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: String,
    pub endpoint: String,
    pub initial_data: Option<Value>,
}

impl EndpointSpec {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            initial_data: None,
        }
    }

    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }
}

// == Multi Collection ==
#[derive(Debug)]
pub struct MultiCollection {
    hooks: Vec<(String, CollectionHook)>,
}

impl MultiCollection {
    /// Builds one hook per spec, sharing `fetcher` and the client `cache`.
    pub fn new(
        specs: impl IntoIterator<Item = EndpointSpec>,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<TtlCache<Value>>,
    ) -> Self {
        let hooks = specs
            .into_iter()
            .map(|spec| {
                let mut options = HookOptions::default();
                options.initial_data = spec.initial_data;
                let hook = CollectionHook::new(spec.endpoint, fetcher.clone(), cache.clone(), options);
                (spec.name, hook)
            })
            .collect();
        Self { hooks }
    }

    pub async fn mount_all(&self) {
        join_all(self.hooks.iter().map(|(_, hook)| hook.mount())).await;
    }

    pub async fn refetch_all(&self) {
        join_all(self.hooks.iter().map(|(_, hook)| hook.refetch())).await;
    }

    pub async fn refresh_all(&self) {
        join_all(self.hooks.iter().map(|(_, hook)| hook.refresh())).await;
    }

    /// True while any hook is loading.
    pub fn loading(&self) -> bool {
        self.hooks.iter().any(|(_, hook)| hook.loading())
    }

    /// First error in declaration order.
    pub fn error(&self) -> Option<FetchError> {
        self.hooks.iter().find_map(|(_, hook)| hook.error())
    }

    pub fn data(&self, name: &str) -> Option<Value> {
        self.hook(name).and_then(CollectionHook::data)
    }

    pub fn hook(&self, name: &str) -> Option<&CollectionHook> {
        self.hooks
            .iter()
            .find(|(hook_name, _)| hook_name == name)
            .map(|(_, hook)| hook)
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn snapshots(&self) -> Vec<(String, HookSnapshot)> {
        self.hooks
            .iter()
            .map(|(name, hook)| (name.clone(), hook.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Answers requests from a fixed table keyed by endpoint.
    struct TableFetcher(HashMap<&'static str, Result<Value, FetchError>>);

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn request(
            &self,
            _method: Method,
            endpoint: &str,
            _body: Option<Value>,
        ) -> Result<Value, FetchError> {
            self.0
                .get(endpoint)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Status {
                    status: 404,
                    message: format!("{endpoint} not found"),
                }))
        }
    }

    fn multi(table: Vec<(&'static str, Result<Value, FetchError>)>) -> MultiCollection {
        let specs = vec![
            EndpointSpec::new("services", "/api/services").with_initial_data(json!([])),
            EndpointSpec::new("solutions", "/api/solutions"),
            EndpointSpec::new("caseStudies", "/api/caseStudies"),
        ];
        MultiCollection::new(
            specs,
            Arc::new(TableFetcher(table.into_iter().collect())),
            Arc::new(TtlCache::new(Duration::from_secs(300))),
        )
    }

    #[test]
    fn test_initial_state() {
        let multi = multi(vec![]);
        assert_eq!(multi.names(), vec!["services", "solutions", "caseStudies"]);
        assert_eq!(multi.data("services"), Some(json!([])));
        assert_eq!(multi.data("solutions"), None);
        assert!(!multi.loading());
        assert!(multi.error().is_none());
        assert!(multi.hook("unknown").is_none());
    }

    #[tokio::test]
    async fn test_mount_all_collects_data() {
        let multi = multi(vec![
            ("/api/services", Ok(json!([{"id": "s1"}]))),
            ("/api/solutions", Ok(json!([{"id": "x1"}]))),
            ("/api/caseStudies", Ok(json!([]))),
        ]);

        multi.mount_all().await;

        assert!(!multi.loading());
        assert!(multi.error().is_none());
        assert_eq!(multi.data("solutions"), Some(json!([{"id": "x1"}])));
        assert_eq!(multi.snapshots().len(), 3);
    }

    #[tokio::test]
    async fn test_error_is_first_in_declaration_order() {
        let multi = multi(vec![
            ("/api/services", Ok(json!([]))),
            (
                "/api/solutions",
                Err(FetchError::Transport("solutions down".into())),
            ),
            (
                "/api/caseStudies",
                Err(FetchError::Transport("case studies down".into())),
            ),
        ]);

        multi.mount_all().await;

        assert_eq!(
            multi.error(),
            Some(FetchError::Transport("solutions down".into()))
        );
        assert_eq!(multi.data("services"), Some(json!([])));
    }

    #[tokio::test]
    async fn test_refresh_all_keeps_data_on_failure() {
        let multi = multi(vec![
            ("/api/services", Ok(json!([1]))),
            ("/api/solutions", Ok(json!([2]))),
            ("/api/caseStudies", Ok(json!([3]))),
            ("/api/services/refresh", Ok(json!([10]))),
        ]);
        multi.mount_all().await;

        multi.refresh_all().await;

        assert_eq!(multi.data("services"), Some(json!([10])));
        assert_eq!(multi.data("caseStudies"), Some(json!([3])));
        assert!(multi.error().is_none());
        assert!(!multi.loading());
    }
}
