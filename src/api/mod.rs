//! API Module
//!
//! HTTP handlers and routing for the collection endpoints.
//!
//! # Endpoints
//! - `GET|POST /api/:collection` - List / create
//! - `POST /api/:collection/refresh` - Forced re-read
//! - `GET|PUT|DELETE /api/:collection/:id` - Single document
//! - `GET|DELETE /cache`, `GET /cache/:key` - Cache inspection
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
