//! Error types for the data-access layer
//!
//! Cache operations cannot fail; everything fallible lives in configuration,
//! store access, validation and client fetches.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::schema::ValidationError;

// == Configuration Error ==
/// Raised synchronously while configuring the store connection or the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// None of connection string, handle or factory was supplied
    #[error("no store connection configured: supply a connection string, a handle or a factory")]
    MissingConnection,

    /// More than one connection mode was supplied
    #[error("ambiguous store connection: supply exactly one of connection string, handle or factory")]
    AmbiguousConnection,

    /// A configuration value could not be used
    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}

// == Store Error ==
/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the connection was closed
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure while executing an operation
    #[error("store operation failed: {0}")]
    Operation(String),
}

// == Service Error ==
/// Error surfaced by the read/write paths and the HTTP boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Could not obtain a store connection
    #[error("connection error: {0}")]
    Connection(String),

    /// Payload rejected by the collection schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Target document does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// No collection with this name is registered
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// Malformed request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Store failure during read or write
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// HTTP status the boundary reports for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) | ServiceError::UnknownCollection(_) => StatusCode::NOT_FOUND,
            ServiceError::Connection(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Fetch Error ==
/// Client-side failure while talking to the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or the request could not be built
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with a non-2xx status
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected envelope
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the read/write paths.
pub type Result<T> = std::result::Result<T, ServiceError>;
