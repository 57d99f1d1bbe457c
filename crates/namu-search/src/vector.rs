//! Plain vector search with a lexical relevance gate.
//!
//! Nearest neighbors by embedding can be close in vector space yet unrelated
//! to the query's topic. Short queries therefore have to appear literally in
//! a candidate before it is scored.

use std::sync::Arc;

use namu_core::scoring::similarity_percent;
use namu_core::types::snippet;
use namu_core::{Result, SearchResult, VectorHit};
use namu_embed::EmbeddingProvider;
use namu_store::RetrievalStore;

use crate::config::SearchConfig;
use crate::hybrid::truncate_chars;

/// Queries longer than this bypass the lexical gate.
const GATE_BYPASS_CHARS: usize = 50;

/// Queries up to this length must match whole.
const GATE_WHOLE_QUERY_CHARS: usize = 30;

/// Single-signal vector search.
pub struct VectorSearch {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RetrievalStore>,
    config: SearchConfig,
}

impl VectorSearch {
    /// Create a vector search over a shared provider and store.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RetrievalStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Search for the `limit` nearest documents that pass the gate.
    ///
    /// Embedding errors propagate. Store errors are logged and yield no
    /// results.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let truncated = truncate_chars(query, self.config.max_query_length);
        let Some(embedding) = self.embedder.embed(truncated).await? else {
            tracing::debug!(query, "provider returned no query embedding");
            return Ok(Vec::new());
        };

        let hits = match self.store.search_by_vector(&embedding, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "vector search failed");
                return Ok(Vec::new());
            }
        };

        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| passes_lexical_gate(query, &hit.title, &hit.content))
            .map(|hit| self.to_result(hit))
            .filter(|r| r.similarity_percent >= self.config.min_similarity_percent)
            .collect();

        tracing::debug!(query, results = results.len(), "vector search");
        Ok(results)
    }

    fn to_result(&self, hit: VectorHit) -> SearchResult {
        SearchResult {
            id: hit.id,
            title: hit.title,
            snippet: snippet(&hit.content, self.config.snippet_length),
            similarity_percent: similarity_percent(hit.distance),
            score: None,
        }
    }
}

/// Whether a candidate is lexically related to `query`.
///
/// Long queries always pass. Short queries must appear whole in the title
/// or content. Medium queries pass when any token longer than one character
/// appears. Matching is case-insensitive.
pub fn passes_lexical_gate(query: &str, title: &str, content: &str) -> bool {
    let query = query.trim();
    let len = query.chars().count();
    if len > GATE_BYPASS_CHARS {
        return true;
    }

    let query = query.to_lowercase();
    let title = title.to_lowercase();
    let content = content.to_lowercase();
    let contains = |needle: &str| title.contains(needle) || content.contains(needle);

    if len <= GATE_WHOLE_QUERY_CHARS {
        contains(&query)
    } else {
        query
            .split_whitespace()
            .filter(|token| token.chars().count() > 1)
            .any(contains)
    }
}

// ============================================================================
// Tests
// ============================================================================
