//! Search endpoints.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use namu_core::SearchResult;
use namu_search::{HybridSearchOutcome, HybridSearchRequest, MAX_LIMIT};

use crate::error::ApiError;
use crate::state::AppState;

fn default_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_keyword_weight() -> f64 {
    0.5
}

/// Query parameters for `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Query text.
    #[serde(default)]
    pub q: String,
    /// Maximum results.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Query parameters for `/api/hybrid`.
#[derive(Debug, Deserialize)]
pub struct HybridParams {
    /// Query text.
    #[serde(default)]
    pub q: String,
    /// Include the vector signal.
    #[serde(default = "default_true")]
    pub vector: bool,
    /// Include the full-text signal.
    #[serde(default = "default_true")]
    pub text: bool,
    /// Keyword weight in [0, 1].
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Maximum results.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// GET /api/search - plain vector search.
pub async fn vector(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let limit = params.limit.clamp(1, MAX_LIMIT);
    Ok(Json(state.vector.search(&params.q, limit).await?))
}

/// GET /api/hybrid - weighted vector and full-text search.
pub async fn hybrid(
    State(state): State<AppState>,
    Query(params): Query<HybridParams>,
) -> Result<Json<HybridSearchOutcome>, ApiError> {
    let request = HybridSearchRequest::new(params.q)
        .with_vector(params.vector)
        .with_text(params.text)
        .with_keyword_weight(params.keyword_weight)
        .with_limit(params.limit);
    Ok(Json(state.hybrid.search(&request).await?))
}
