//! Shared handler state.

use std::sync::Arc;

use namu_embed::EmbeddingProvider;
use namu_ingest::{IngestionRunner, RowSource};
use namu_search::{HybridSearchEngine, SearchConfig, VectorSearch};
use namu_store::RetrievalStore;

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Launches background ingestion runs.
    pub runner: IngestionRunner,
    /// Source for `POST /api/ingest`; ingestion is refused without one.
    pub source: Option<Arc<dyn RowSource>>,
    /// Store used for statistics.
    pub store: Arc<dyn RetrievalStore>,
    /// Plain vector search.
    pub vector: Arc<VectorSearch>,
    /// Hybrid search.
    pub hybrid: Arc<HybridSearchEngine>,
}

impl AppState {
    /// Wire both search modes over one provider and store.
    pub fn new(
        runner: IngestionRunner,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RetrievalStore>,
        search: SearchConfig,
    ) -> Self {
        Self {
            runner,
            source: None,
            vector: Arc::new(VectorSearch::new(
                Arc::clone(&embedder),
                Arc::clone(&store),
                search.clone(),
            )),
            hybrid: Arc::new(HybridSearchEngine::new(embedder, Arc::clone(&store), search)),
            store,
        }
    }

    /// Set the row source used by ingestion requests.
    pub fn with_source(mut self, source: Arc<dyn RowSource>) -> Self {
        self.source = Some(source);
        self
    }
}
