//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the process-wide record store and conditional-update service
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and header helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router around an already-constructed service set.
///
/// Tests pass their own `AppServices` so each gets an isolated store.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1/pets", routes::pets::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

/// Router backed by a fresh in-memory store (public entrypoint used by `main.rs`).
pub fn build_default_app() -> Router {
    build_app(Arc::new(services::build_services()))
}
