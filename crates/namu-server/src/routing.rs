//! Axum router configuration.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers::{ingest, search, stats};
use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Ingestion
        .route("/api/ingest", post(ingest::start))
        .route("/api/progress", get(ingest::progress))
        // Statistics
        .route("/api/stats", get(stats::stats))
        // Search
        .route("/api/search", get(search::vector))
        .route("/api/hybrid", get(search::hybrid))
        .with_state(state)
}
