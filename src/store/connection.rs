//! Store connection lifecycle.
//!
//! A [`StoreContext`] is configured once with exactly one connection mode and
//! connects lazily on first use. It is passed explicitly to whatever needs the
//! store; there is no global connection.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::{DocumentStore, MemoryStore};
use crate::error::{ConfigError, ServiceError, StoreError};

/// Async constructor for a store handle.
pub type StoreFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn DocumentStore>, StoreError>> + Send + Sync>;

// == Connection Options ==
/// The three ways to reach a store. Exactly one must be set.
#[derive(Clone, Default)]
pub struct ConnectionOptions {
    /// Connection string, e.g. `memory://default`
    pub uri: Option<String>,
    /// Pre-built store handle
    pub handle: Option<Arc<dyn DocumentStore>>,
    /// Factory invoked on first use
    pub factory: Option<StoreFactory>,
}

impl ConnectionOptions {
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn handle(handle: Arc<dyn DocumentStore>) -> Self {
        Self {
            handle: Some(handle),
            ..Self::default()
        }
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn DocumentStore>, StoreError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            factory: Some(Arc::new(factory)),
            ..Self::default()
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("uri", &self.uri)
            .field("handle", &self.handle.is_some())
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

#[derive(Clone)]
enum ConnectionSource {
    Uri(Url),
    Handle(Arc<dyn DocumentStore>),
    Factory(StoreFactory),
}

impl ConnectionSource {
    fn from_options(options: ConnectionOptions) -> Result<Self, ConfigError> {
        match (options.uri, options.handle, options.factory) {
            (Some(uri), None, None) => Url::parse(&uri)
                .map(ConnectionSource::Uri)
                .map_err(|err| ConfigError::Invalid {
                    key: "uri".to_string(),
                    message: err.to_string(),
                }),
            (None, Some(handle), None) => Ok(ConnectionSource::Handle(handle)),
            (None, None, Some(factory)) => Ok(ConnectionSource::Factory(factory)),
            (None, None, None) => Err(ConfigError::MissingConnection),
            _ => Err(ConfigError::AmbiguousConnection),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ConnectionSource::Uri(_) => "uri",
            ConnectionSource::Handle(_) => "handle",
            ConnectionSource::Factory(_) => "factory",
        }
    }

    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match self {
            ConnectionSource::Uri(url) => match url.scheme() {
                "memory" => Ok(Arc::new(MemoryStore::new())),
                scheme => Err(StoreError::Unavailable(format!(
                    "no adapter for '{scheme}' connection strings; supply a handle or factory"
                ))),
            },
            ConnectionSource::Handle(handle) => Ok(handle.clone()),
            ConnectionSource::Factory(factory) => factory().await,
        }
    }
}

struct ContextState {
    source: ConnectionSource,
    connection: Option<Arc<dyn DocumentStore>>,
}

// == Store Context ==
/// Owns the configured connection source and the live connection.
pub struct StoreContext {
    state: Mutex<ContextState>,
}

impl StoreContext {
    /// Validates `options` and builds a context. Does not connect.
    ///
    /// Fails with [`ConfigError`] when no mode, or more than one, is given.
    pub fn configure(options: ConnectionOptions) -> Result<Self, ConfigError> {
        let source = ConnectionSource::from_options(options)?;
        debug!(mode = source.describe(), "store connection configured");

        Ok(Self {
            state: Mutex::new(ContextState {
                source,
                connection: None,
            }),
        })
    }

    /// Replaces the connection source. Any open connection is dropped.
    pub async fn reconfigure(&self, options: ConnectionOptions) -> Result<(), ConfigError> {
        let source = ConnectionSource::from_options(options)?;
        let mut state = self.state.lock().await;
        info!(mode = source.describe(), "store connection reconfigured");
        state.source = source;
        state.connection = None;
        Ok(())
    }

    /// Returns the live connection, connecting on first use.
    ///
    /// Connection failures are returned as-is and not retried; the next call
    /// tries again.
    pub async fn database(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        let mut state = self.state.lock().await;
        if let Some(connection) = &state.connection {
            return Ok(connection.clone());
        }

        let connection = state
            .source
            .connect()
            .await
            .map_err(|err| ServiceError::Connection(err.to_string()))?;
        info!(mode = state.source.describe(), "connected to document store");
        state.connection = Some(connection.clone());
        Ok(connection)
    }

    /// Whether a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connection.is_some()
    }

    /// Drops the open connection. Calling it again is a no-op.
    ///
    /// Returns whether a connection was open. A later [`database`](Self::database)
    /// call connects again from the configured source.
    pub async fn close(&self) -> bool {
        let closed = self.state.lock().await.connection.take().is_some();
        if closed {
            info!("document store connection closed");
        }
        closed
    }
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext").finish_non_exhaustive()
    }
}
