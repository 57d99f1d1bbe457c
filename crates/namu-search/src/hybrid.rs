//! Hybrid search combining vector and full-text signals.
//!
//! Scores come from `namu_core::scoring`. When both signals are requested and
//! the store supports it, fusion is pushed down into one store query; else the
//! engine runs each sub-query on its own and fuses in process. Both paths
//! rank a shared candidate set identically.
//!
//! Sub-query failures are contained: a failed search contributes no rows and
//! a failed EXPLAIN contributes the empty placeholder. Only an embedding
//! failure on a vector-only request reaches the caller.

use serde::Serialize;
use std::sync::Arc;

use namu_core::scoring::{NEUTRAL_DISTANCE, similarity_percent};
use namu_core::types::snippet;
use namu_core::{FusedHit, FusionAccumulator, FusionWeights, Result, SearchResult};
use namu_embed::EmbeddingProvider;
use namu_store::RetrievalStore;

use crate::config::SearchConfig;

/// Upper bound on results per request.
pub const MAX_LIMIT: usize = 100;

// ============================================================================
// Request and outcome
// ============================================================================

/// A hybrid search request.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridSearchRequest {
    /// Raw query text.
    pub query: String,
    /// Include the vector signal.
    pub use_vector: bool,
    /// Include the full-text signal.
    pub use_text: bool,
    /// Keyword weight in [0, 1]; the semantic weight is its complement.
    pub keyword_weight: f64,
    /// Maximum results, clamped to [1, 100].
    pub limit: usize,
}

impl HybridSearchRequest {
    /// A request for `query` with both signals, equal weights, and 10 results.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            use_vector: true,
            use_text: true,
            keyword_weight: 0.5,
            limit: 10,
        }
    }

    /// Enable or disable the vector signal.
    pub fn with_vector(mut self, enabled: bool) -> Self {
        self.use_vector = enabled;
        self
    }

    /// Enable or disable the full-text signal.
    pub fn with_text(mut self, enabled: bool) -> Self {
        self.use_text = enabled;
        self
    }

    /// Set the keyword weight.
    pub fn with_keyword_weight(mut self, weight: f64) -> Self {
        self.keyword_weight = weight;
        self
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Ranked results plus what was executed and how.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridSearchOutcome {
    /// Ranked results, best first.
    pub results: Vec<SearchResult>,
    /// Display rendering of the executed queries.
    pub generated_sql: String,
    /// Merged EXPLAIN output as JSON text.
    #[serde(rename = "explanation")]
    pub diagnostics: String,
}

// ============================================================================
// Engine
// ============================================================================

/// Weighted fusion of vector and full-text search.
pub struct HybridSearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RetrievalStore>,
    config: SearchConfig,
}

impl HybridSearchEngine {
    /// Create an engine over a shared provider and store.
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

    /// Run a hybrid search.
    pub async fn search(&self, request: &HybridSearchRequest) -> Result<HybridSearchOutcome> {
        let query = request.query.trim();
        if query.is_empty() {
            return Ok(self.empty_outcome(&self.config.empty_sql_placeholder));
        }
        if !request.use_vector && !request.use_text {
            return Ok(self.empty_outcome(&self.config.no_search_sql_placeholder));
        }

        let weights = FusionWeights::from_keyword_weight(request.keyword_weight);
        let limit = request.limit.clamp(1, MAX_LIMIT);

        let embedding = if request.use_vector {
            self.embed_query(query, request.use_text).await?
        } else {
            None
        };
        if embedding.is_none() && !request.use_text {
            return Ok(self.empty_outcome(&self.config.no_search_sql_placeholder));
        }

        tracing::debug!(
            query,
            vector = embedding.is_some(),
            text = request.use_text,
            keyword_weight = weights.keyword,
            limit,
            "hybrid search"
        );

        if let Some(embedding) = &embedding
            && request.use_text
            && self.store.supports_unified_hybrid()
        {
            match self.unified(embedding, query, limit, weights).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    tracing::warn!(error = %e, "unified hybrid query failed, falling back");
                }
            }
        }

        Ok(self
            .decomposed(embedding.as_deref(), request.use_text, query, limit, weights)
            .await)
    }

    /// Embed the query, degrading to `None` when text search can carry on alone.
    async fn embed_query(&self, query: &str, text_fallback: bool) -> Result<Option<Vec<f32>>> {
        let truncated = truncate_chars(query, self.config.max_query_length);
        match self.embedder.embed(truncated).await {
            Ok(embedding) => Ok(embedding),
            Err(e) if text_fallback => {
                tracing::warn!(error = %e, "query embedding failed, using full-text only");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn unified(
        &self,
        embedding: &[f32],
        query: &str,
        limit: usize,
        weights: FusionWeights,
    ) -> Result<HybridSearchOutcome> {
        let (hits, explanation) = tokio::join!(
            self.store
                .search_by_unified_hybrid(embedding, query, limit, weights),
            self.store
                .explain_unified_hybrid(embedding, query, limit, weights),
        );
        let hits = hits?;

        Ok(HybridSearchOutcome {
            results: self.to_results(hits),
            generated_sql: format!(
                "-- unified hybrid\n{}",
                self.store.unified_hybrid_sql(query, limit, weights)
            ),
            diagnostics: self.explanation_or_empty("unified explain", explanation),
        })
    }

    async fn decomposed(
        &self,
        embedding: Option<&[f32]>,
        use_text: bool,
        query: &str,
        limit: usize,
        weights: FusionWeights,
    ) -> HybridSearchOutcome {
        let vector_k = self.config.vector_candidates;
        let text_k = self.config.text_candidates;
        let empty = &self.config.empty_explanation_placeholder;

        let vector_hits = async {
            match embedding {
                Some(e) => rows_or_empty(
                    "vector search",
                    self.store.search_by_vector(e, vector_k).await,
                ),
                None => Vec::new(),
            }
        };
        let vector_explain = async {
            match embedding {
                Some(e) => self.explanation_or_empty(
                    "vector explain",
                    self.store.explain_vector(e, vector_k).await,
                ),
                None => empty.clone(),
            }
        };
        let text_hits = async {
            if use_text {
                rows_or_empty(
                    "full-text search",
                    self.store.search_by_full_text(query, text_k).await,
                )
            } else {
                Vec::new()
            }
        };
        let text_explain = async {
            if use_text {
                self.explanation_or_empty(
                    "full-text explain",
                    self.store.explain_full_text(query, text_k).await,
                )
            } else {
                empty.clone()
            }
        };

        let (vector_hits, vector_explain, text_hits, text_explain) =
            tokio::join!(vector_hits, vector_explain, text_hits, text_explain);

        let mut acc = FusionAccumulator::new(weights, self.config.rrf_k);
        acc.add_vector_hits(&vector_hits);
        acc.add_text_hits(&text_hits);

        let mut sql = Vec::new();
        if embedding.is_some() {
            sql.push(format!("-- vector\n{}", self.store.vector_sql(vector_k)));
        }
        if use_text {
            sql.push(format!(
                "-- full-text (BM25)\n{}",
                self.store.full_text_sql(query, text_k)
            ));
        }

        HybridSearchOutcome {
            results: self.to_results(acc.into_ranked(limit)),
            generated_sql: sql.join("\n\n"),
            diagnostics: merge_explanations(&vector_explain, &text_explain, empty),
        }
    }

    fn to_results(&self, hits: Vec<FusedHit>) -> Vec<SearchResult> {
        hits.into_iter()
            .map(|hit| SearchResult {
                id: hit.id,
                title: hit.title,
                snippet: snippet(&hit.content, self.config.snippet_length),
                similarity_percent: similarity_percent(hit.distance.unwrap_or(NEUTRAL_DISTANCE)),
                score: Some(hit.total_score),
            })
            .collect()
    }

    fn explanation_or_empty(&self, label: &str, explanation: Result<String>) -> String {
        explanation.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "{label} failed");
            self.config.empty_explanation_placeholder.clone()
        })
    }

    fn empty_outcome(&self, sql: &str) -> HybridSearchOutcome {
        HybridSearchOutcome {
            results: Vec::new(),
            generated_sql: sql.to_string(),
            diagnostics: self.config.empty_explanation_placeholder.clone(),
        }
    }
}

fn rows_or_empty<T>(label: &str, rows: Result<Vec<T>>) -> Vec<T> {
    rows.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "{label} failed");
        Vec::new()
    })
}

/// Merge two EXPLAIN payloads into one.
///
/// An `empty` side yields the other side unchanged. Two JSON arrays are
/// concatenated. Anything else is wrapped as `[<vector>, <text>]`.
pub fn merge_explanations(vector: &str, text: &str, empty: &str) -> String {
    if vector == empty {
        return text.to_string();
    }
    if text == empty {
        return vector.to_string();
    }

    let wrapped = || format!("[{vector}, {text}]");
    match (
        serde_json::from_str::<Vec<serde_json::Value>>(vector),
        serde_json::from_str::<Vec<serde_json::Value>>(text),
    ) {
        (Ok(mut plans), Ok(more)) => {
            plans.extend(more);
            serde_json::to_string(&plans).unwrap_or_else(|_| wrapped())
        }
        _ => wrapped(),
    }
}

/// The first `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use namu_core::scoring::{text_contribution, vector_contribution};
    use namu_core::{Document, Error};
    use namu_embed::MockEmbeddingProvider;
    use namu_store::MemoryStore;

    const DIM: usize = 8;

    fn corpus(embedder: &MockEmbeddingProvider) -> Vec<Document> {
        [
            ("Seoul", "Seoul is the capital of Korea"),
            ("Busan", "Busan is a port city in Korea"),
            ("Kimchi", "Kimchi is fermented cabbage"),
            ("Hanok", "A hanok is a traditional Korean house"),
            ("Jeju", "Jeju is an island south of the capital"),
        ]
        .into_iter()
        .map(|(title, content)| Document {
            title: title.to_string(),
            content: content.to_string(),
            embedding: embedder.deterministic_embedding(content),
            namespace: None,
            contributors: None,
        })
        .collect()
    }

    fn engine(embedder: MockEmbeddingProvider, store: MemoryStore) -> HybridSearchEngine {
        HybridSearchEngine::new(Arc::new(embedder), Arc::new(store), SearchConfig::default())
    }

    fn seeded(unified: bool) -> (MockEmbeddingProvider, MemoryStore) {
        let embedder = MockEmbeddingProvider::new(DIM);
        let store = MemoryStore::new()
            .with_documents(corpus(&embedder))
            .with_unified_hybrid(unified);
        (embedder, store)
    }

    // ------------------------------------------------------------------------
    // Short circuits
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_blank_query_touches_nothing() {
        let (embedder, store) = seeded(true);
        let engine = engine(embedder.clone(), store.clone());

        for query in ["", "   ", "\t\n"] {
            let outcome = engine.search(&HybridSearchRequest::new(query)).await.unwrap();
            assert!(outcome.results.is_empty());
            assert_eq!(outcome.generated_sql, "");
            assert_eq!(outcome.diagnostics, "[]");
        }
        assert_eq!(embedder.call_count().await, 0);
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_no_signal_selected() {
        let (embedder, store) = seeded(true);
        let engine = engine(embedder.clone(), store.clone());
        let request = HybridSearchRequest::new("korea")
            .with_vector(false)
            .with_text(false);

        let outcome = engine.search(&request).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.generated_sql, "-- no search signal selected");
        assert_eq!(outcome.diagnostics, "[]");
        assert_eq!(embedder.call_count().await, 0);
        assert_eq!(store.calls().total(), 0);
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unified_path_used_when_supported() {
        let (embedder, store) = seeded(true);
        let engine = engine(embedder, store.clone());

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        let calls = store.calls();
        assert_eq!(calls.unified, 1);
        assert_eq!(calls.vector, 0);
        assert_eq!(calls.full_text, 0);
        assert!(outcome.generated_sql.starts_with("-- unified hybrid\n"));
        assert!(!outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_unified_failure_falls_back() {
        let (embedder, store) = seeded(true);
        let store = store.failing_unified();
        let engine = engine(embedder, store.clone());

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        let calls = store.calls();
        assert_eq!(calls.unified, 1);
        assert_eq!(calls.vector, 1);
        assert_eq!(calls.full_text, 1);
        assert!(outcome.generated_sql.starts_with("-- vector\n"));
        assert!(outcome.generated_sql.contains("\n\n-- full-text (BM25)\n"));
        assert!(!outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_unified_and_decomposed_rank_identically() {
        let (embedder, unified_store) = seeded(true);
        let (_, decomposed_store) = seeded(false);
        let unified = engine(embedder.clone(), unified_store);
        let decomposed = engine(embedder, decomposed_store);

        for weight in [0.0, 0.3, 0.5, 0.8, 1.0] {
            let request = HybridSearchRequest::new("capital korea").with_keyword_weight(weight);
            let a = unified.search(&request).await.unwrap().results;
            let b = decomposed.search(&request).await.unwrap().results;

            let ids_a: Vec<i64> = a.iter().map(|r| r.id).collect();
            let ids_b: Vec<i64> = b.iter().map(|r| r.id).collect();
            assert_eq!(ids_a, ids_b, "keyword weight {weight}");
            for (x, y) in a.iter().zip(&b) {
                assert!((x.score.unwrap() - y.score.unwrap()).abs() < 1e-9);
                assert!((x.similarity_percent - y.similarity_percent).abs() < 1e-9);
            }
        }
    }

    #[tokio::test]
    async fn test_both_signals_sum_contributions() {
        let (embedder, store) = seeded(false);
        let engine = engine(embedder.clone(), store.clone());
        let request = HybridSearchRequest::new("kimchi").with_keyword_weight(0.3);

        let outcome = engine.search(&request).await.unwrap();
        let top = &outcome.results[0];
        assert_eq!(top.title, "Kimchi");

        let query_vec = embedder.deterministic_embedding("kimchi");
        let vector_hit = store
            .search_by_vector(&query_vec, 50)
            .await
            .unwrap()
            .into_iter()
            .find(|h| h.id == top.id)
            .unwrap();
        let expected =
            vector_contribution(vector_hit.distance, 0.7) + text_contribution(1, 60, 0.3);
        assert!((top.score.unwrap() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_text_only_uses_neutral_distance() {
        let (embedder, store) = seeded(true);
        let engine = engine(embedder.clone(), store.clone());
        let request = HybridSearchRequest::new("fermented").with_vector(false);

        let outcome = engine.search(&request).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].similarity_percent, 50.0);
        assert!((outcome.results[0].score.unwrap() - 0.5).abs() < 1e-12);
        assert!(outcome.generated_sql.starts_with("-- full-text (BM25)\n"));
        assert!(!outcome.generated_sql.contains("-- vector"));
        assert_eq!(embedder.call_count().await, 0);
        assert_eq!(store.calls().unified, 0);
    }

    #[tokio::test]
    async fn test_limit_clamped() {
        let (embedder, store) = seeded(false);
        let engine = engine(embedder, store);

        let zero = HybridSearchRequest::new("korea").with_limit(0);
        assert_eq!(engine.search(&zero).await.unwrap().results.len(), 1);

        let huge = HybridSearchRequest::new("korea").with_limit(10_000);
        assert!(engine.search(&huge).await.unwrap().results.len() <= MAX_LIMIT);
    }

    #[tokio::test]
    async fn test_results_sorted_by_score() {
        let (embedder, store) = seeded(false);
        let engine = engine(embedder, store);

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        let scores: Vec<f64> = outcome.results.iter().map(|r| r.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    // ------------------------------------------------------------------------
    // Degradation
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_embedding_failure_vector_only_propagates() {
        let (_, store) = seeded(true);
        let engine = engine(MockEmbeddingProvider::failing("down"), store.clone());
        let request = HybridSearchRequest::new("korea").with_text(false);

        let err = engine.search(&request).await.unwrap_err();
        assert!(matches!(err, Error::RemoteService { status: 500, .. }));
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_text() {
        let (_, store) = seeded(true);
        let engine = engine(MockEmbeddingProvider::failing("down"), store.clone());

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        assert!(!outcome.results.is_empty());
        assert!(outcome.results.iter().all(|r| r.similarity_percent == 50.0));
        let calls = store.calls();
        assert_eq!(calls.unified, 0);
        assert_eq!(calls.vector, 0);
        assert_eq!(calls.full_text, 1);
    }

    #[tokio::test]
    async fn test_sub_query_failures_are_contained() {
        let (embedder, store) = seeded(false);
        let store = store.failing_vector().failing_explain();
        let engine = engine(embedder, store);

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        assert!(!outcome.results.is_empty());
        assert_eq!(outcome.diagnostics, "[]");
    }

    #[tokio::test]
    async fn test_all_sub_queries_failing_yields_empty() {
        let (embedder, store) = seeded(false);
        let store = store.failing_vector().failing_full_text().failing_explain();
        let engine = engine(embedder, store);

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.generated_sql.contains("-- vector"));
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_decomposed_diagnostics_concatenated() {
        let (embedder, store) = seeded(false);
        let engine = engine(embedder, store);

        let outcome = engine.search(&HybridSearchRequest::new("korea")).await.unwrap();
        let plans: Vec<serde_json::Value> = serde_json::from_str(&outcome.diagnostics).unwrap();
        assert_eq!(plans.len(), 2);
    }

    #[test]
    fn test_merge_explanations() {
        assert_eq!(merge_explanations("[]", r#"[{"b":2}]"#, "[]"), r#"[{"b":2}]"#);
        assert_eq!(merge_explanations(r#"[{"a":1}]"#, "[]", "[]"), r#"[{"a":1}]"#);
        assert_eq!(
            merge_explanations(r#"[{"a":1}]"#, r#"[{"b":2}]"#, "[]"),
            r#"[{"a":1},{"b":2}]"#
        );
        assert_eq!(merge_explanations("oops", r#"[1]"#, "[]"), "[oops, [1]]");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("나무위키", 2), "나무");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let outcome = HybridSearchOutcome {
            results: vec![],
            generated_sql: "-- vector".to_string(),
            diagnostics: "[]".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["generatedSql"], "-- vector");
        assert_eq!(json["explanation"], "[]");
    }
}
