//! Document statistics.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /api/stats - stored document count, 0 when the store is unavailable.
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let count = state.store.count().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "document count failed");
        0
    });
    Json(json!({ "documentCount": count }))
}
