//! API route definitions
//!
//! - /api/v1/readings - telemetry ingest and recent records
//! - /api/v1/cleaning - cleaning request, poll and acknowledge
//! - /api/v1/classifier/reload - re-read the model artifact
//! - /api/v1/system/health - classifier, storage and counters

use axum::middleware as axum_mw;
use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, HubState};
use super::middleware;

/// Create all v1 API routes
pub fn api_routes(state: HubState) -> Router {
    Router::new()
        .route(
            "/readings",
            post(handlers::ingest_reading).get(handlers::get_recent_readings),
        )
        // Cleaning coordination
        .route("/cleaning", get(handlers::get_cleaning))
        .route("/cleaning/request", post(handlers::request_cleaning))
        .route("/cleaning/ack", post(handlers::acknowledge_cleaning))
        // Classifier
        .route("/classifier/reload", post(handlers::reload_classifier))
        .route("/system/health", get(handlers::system_health))
        .with_state(state)
}

/// Route the deployed firmware still posts to
pub fn legacy_routes(state: HubState) -> Router {
    Router::new()
        .route("/api/datos", post(handlers::ingest_reading))
        .layer(axum_mw::from_fn(middleware::add_legacy_deprecation_headers))
        .with_state(state)
}
