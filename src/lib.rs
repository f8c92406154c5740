//! # OCItrack Backend Library
//!
//! Core library for OCItrack, a job-application tracker for law-school
//! students going through on-campus-interview (OCI) recruiting. Users log
//! the firms and cities they applied to, record stage progression
//! (Applied → Screener → Callback → Offer/Rejection), and see cohort
//! statistics computed across all users' records for the same firm.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server and routing
//! - **SQLx**: Asynchronous database operations with SQLite
//! - **Tokio**: Async runtime
//! - **Serde**: JSON serialization for the REST API
//!
//! ## Core Components
//!
//! - [`config`]: Application configuration management
//! - [`db`]: Database schema initialization and migrations
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`auth`]: Password hashing, token issuance, and the current-user extractor
//! - [`stats`]: Per-firm cohort statistics (success rates, medians, funnel)
//! - [`metrics`]: Application usage counters
//! - [`middleware`]: Rate limiting and security headers
//! - [`routes`]: HTTP API endpoint handlers
//! - [`state`]: Shared application state
//! - [`types`]: Data transfer objects and shared type definitions

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post, put},
    Router,
};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;

use state::AppState;

/// Builds the full application router with all middleware layers.
/// Shared between the binary and the integration tests.
pub fn build_router(state: AppState) -> Router {
    let cfg_arc = state.config.clone();

    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/readyz", get(routes::health::readyz))
        .route("/metrics", get(routes::health::metrics))
        .route("/metrics/prometheus", get(routes::health::metrics_prometheus))
        .route("/version", get(routes::health::version))
        .route("/login", post(routes::auth::login))
        .route("/users", post(routes::users::create_user))
        .route(
            "/users/me",
            get(routes::users::get_me).put(routes::users::update_me).delete(routes::users::delete_me),
        )
        .route(
            "/profiles/me",
            get(routes::profiles::get_my_profile).put(routes::profiles::update_my_profile),
        )
        .route("/applications", post(routes::applications::create_application))
        .route("/applications/me", get(routes::applications::list_my_applications))
        .route("/applications/me/:id", get(routes::applications::get_my_application))
        .route("/applications/total", get(routes::applications::total_applications))
        .route(
            "/applications/:id",
            put(routes::applications::update_application)
                .delete(routes::applications::delete_application),
        )
        .with_state(state)
        // Request bodies are small JSON payloads; 1 MB is already generous
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg_arc, middleware::security_headers::security_headers_middleware))
}
