//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the import/export orchestrator
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>, config: &ApiConfig) -> Router {
    let api = routes::router()
        .layer(Extension(services))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v0", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
