//! The retrieval store trait.

use async_trait::async_trait;
use namu_core::{Document, Error, FusedHit, FusionWeights, Result, TextHit, VectorHit};

/// Diagnostics text meaning "no plan available".
pub const EMPTY_EXPLANATION: &str = "[]";

/// Storage and retrieval operations consumed by ingestion and search.
///
/// Query methods return errors rather than swallowing them; callers decide
/// which failures are fatal. The `*_sql` methods render the query text with
/// literal values for display only and never touch the database.
#[async_trait]
pub trait RetrievalStore: Send + Sync {
    /// Persist a batch of documents, all or nothing.
    async fn insert_batch(&self, documents: &[Document]) -> Result<()>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<u64>;

    /// Nearest neighbors by cosine distance, closest first.
    async fn search_by_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<VectorHit>>;

    /// Full-text matches with 1-based ranks, best first.
    async fn search_by_full_text(&self, query: &str, limit: usize) -> Result<Vec<TextHit>>;

    /// Whether [`search_by_unified_hybrid`](Self::search_by_unified_hybrid) is available.
    fn supports_unified_hybrid(&self) -> bool {
        false
    }

    /// Vector and full-text candidates fused and ranked by the store.
    async fn search_by_unified_hybrid(
        &self,
        _embedding: &[f32],
        _query: &str,
        _limit: usize,
        _weights: FusionWeights,
    ) -> Result<Vec<FusedHit>> {
        Err(Error::store(format!(
            "{} does not support unified hybrid search",
            self.name()
        )))
    }

    /// Query plan for the vector search, as JSON text.
    async fn explain_vector(&self, _embedding: &[f32], _limit: usize) -> Result<String> {
        Ok(EMPTY_EXPLANATION.to_string())
    }

    /// Query plan for the full-text search, as JSON text.
    async fn explain_full_text(&self, _query: &str, _limit: usize) -> Result<String> {
        Ok(EMPTY_EXPLANATION.to_string())
    }

    /// Query plan for the unified hybrid search, as JSON text.
    async fn explain_unified_hybrid(
        &self,
        _embedding: &[f32],
        _query: &str,
        _limit: usize,
        _weights: FusionWeights,
    ) -> Result<String> {
        Ok(EMPTY_EXPLANATION.to_string())
    }

    /// Display text for the vector search.
    fn vector_sql(&self, limit: usize) -> String;

    /// Display text for the full-text search.
    fn full_text_sql(&self, query: &str, limit: usize) -> String;

    /// Display text for the unified hybrid search.
    fn unified_hybrid_sql(&self, query: &str, limit: usize, weights: FusionWeights) -> String;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}
