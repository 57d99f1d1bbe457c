//! Batch embed and insert pipeline.
//!
//! Rows are buffered until a full embedding batch is available, embedded in
//! one call, and appended to a document buffer that is flushed to the store
//! in FIFO chunks. Any failure aborts the run.

use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;

use namu_core::{Document, Error, Result, Row};
use namu_embed::EmbeddingProvider;
use namu_store::RetrievalStore;

use crate::progress::ProgressTracker;
use crate::source::RowSource;

/// Default number of rows per embedding call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Default number of documents per insert call.
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 100;

/// Counts reported by a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Rows consumed from the source.
    pub rows_read: u64,
    /// Documents persisted to the store.
    pub inserted: u64,
}

/// Drives one ingestion run from a row source into a retrieval store.
pub struct IngestionOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RetrievalStore>,
    progress: Arc<ProgressTracker>,
    embed_batch_size: usize,
    insert_batch_size: usize,
}

impl IngestionOrchestrator {
    /// Create an orchestrator with default batch sizes.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RetrievalStore>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            embedder,
            store,
            progress,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }

    /// Set the rows per embedding call. Zero is treated as one.
    pub fn with_embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size.max(1);
        self
    }

    /// Set the documents per insert call. Zero is treated as one.
    pub fn with_insert_batch_size(mut self, size: usize) -> Self {
        self.insert_batch_size = size.max(1);
        self
    }

    /// The shared progress tracker.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// Start a run and drive it to completion.
    ///
    /// Fails with [`Error::AlreadyRunning`] without touching progress when a
    /// run is already in flight.
    pub async fn run(&self, source: &dyn RowSource) -> Result<IngestionSummary> {
        self.progress.try_start()?;
        self.run_started(source).await
    }

    /// Drive a run whose start transition has already been taken.
    ///
    /// Records the outcome in the progress tracker and returns it.
    pub async fn run_started(&self, source: &dyn RowSource) -> Result<IngestionSummary> {
        tracing::info!(
            source = %source.describe(),
            embedder = self.embedder.name(),
            store = self.store.name(),
            "ingestion started"
        );

        match self.ingest(source).await {
            Ok(summary) => {
                self.progress.done(summary.rows_read, summary.inserted);
                tracing::info!(
                    rows_read = summary.rows_read,
                    inserted = summary.inserted,
                    "ingestion finished"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(error = %e, "ingestion failed");
                self.progress.error(e.to_string());
                Err(e)
            }
        }
    }

    async fn ingest(&self, source: &dyn RowSource) -> Result<IngestionSummary> {
        let mut rows = source.open().await?;
        let mut pending: Vec<Row> = Vec::with_capacity(self.embed_batch_size);
        let mut documents: VecDeque<Document> = VecDeque::new();
        let mut summary = IngestionSummary::default();

        while let Some(row) = rows.next().await {
            pending.push(row?);
            summary.rows_read += 1;

            if pending.len() >= self.embed_batch_size {
                self.embed_into(&mut pending, &mut documents).await?;
                summary.inserted += self.flush(&mut documents).await?;
                self.progress.update(summary.rows_read, summary.inserted);
            }
        }

        if !pending.is_empty() {
            self.embed_into(&mut pending, &mut documents).await?;
        }
        while !documents.is_empty() {
            summary.inserted += self.flush(&mut documents).await?;
            self.progress.update(summary.rows_read, summary.inserted);
        }

        Ok(summary)
    }

    /// Embed every pending row and move the results into `documents`.
    async fn embed_into(
        &self,
        pending: &mut Vec<Row>,
        documents: &mut VecDeque<Document>,
    ) -> Result<()> {
        let texts: Vec<String> = pending.iter().map(|row| row.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != pending.len() {
            return Err(Error::response_shape(
                format!("{} embeddings", pending.len()),
                format!("{} embeddings", embeddings.len()),
            ));
        }

        documents.extend(
            pending
                .drain(..)
                .zip(embeddings)
                .map(|(row, embedding)| Document::from_row(row, embedding)),
        );
        Ok(())
    }

    /// Insert one chunk from the front of `documents`.
    async fn flush(&self, documents: &mut VecDeque<Document>) -> Result<u64> {
        let take = documents.len().min(self.insert_batch_size);
        if take == 0 {
            return Ok(0);
        }

        let chunk: Vec<Document> = documents.drain(..take).collect();
        self.store.insert_batch(&chunk).await?;
        tracing::debug!(count = chunk.len(), remaining = documents.len(), "flushed documents");
        Ok(chunk.len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::progress::IngestionStatus;
    use crate::source::VecRowSource;
    use namu_embed::MockEmbeddingProvider;
    use namu_store::MemoryStore;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new(format!("title {i}"), format!("text {i}")))
            .collect()
    }

    fn orchestrator(
        embedder: MockEmbeddingProvider,
        store: MemoryStore,
    ) -> IngestionOrchestrator {
        IngestionOrchestrator::new(
            Arc::new(embedder),
            Arc::new(store),
            Arc::new(ProgressTracker::new()),
        )
    }

    // ------------------------------------------------------------------------
    // Success
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_zero_rows_is_done() {
        let embedder = MockEmbeddingProvider::new(4);
        let store = MemoryStore::new();
        let orch = orchestrator(embedder.clone(), store.clone());

        let summary = orch.run(&VecRowSource::new(vec![])).await.unwrap();
        assert_eq!(summary, IngestionSummary::default());

        let state = orch.progress().get();
        assert_eq!(state.status, IngestionStatus::Done);
        assert_eq!((state.rows_read, state.inserted), (0, 0));
        assert_eq!(embedder.call_count().await, 0);
        assert!(store.calls().inserts.is_empty());
    }

    #[tokio::test]
    async fn test_four_rows_in_batches_of_two() {
        let embedder = MockEmbeddingProvider::new(4);
        let store = MemoryStore::new();
        let orch = orchestrator(embedder.clone(), store.clone())
            .with_embed_batch_size(2)
            .with_insert_batch_size(2);

        let summary = orch.run(&VecRowSource::new(rows(4))).await.unwrap();
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.inserted, 4);

        assert_eq!(embedder.batch_sizes().await, vec![2, 2]);
        let inserts = store.calls().inserts;
        assert_eq!(inserts.iter().sum::<usize>(), 4);
        assert_eq!(inserts, vec![2, 2]);

        let state = orch.progress().get();
        assert_eq!(state.status, IngestionStatus::Done);
        assert_eq!((state.rows_read, state.inserted), (4, 4));
    }

    #[tokio::test]
    async fn test_partial_batches_are_drained() {
        let embedder = MockEmbeddingProvider::new(4);
        let store = MemoryStore::new();
        let orch = orchestrator(embedder.clone(), store.clone())
            .with_embed_batch_size(4)
            .with_insert_batch_size(3);

        let summary = orch.run(&VecRowSource::new(rows(10))).await.unwrap();
        assert_eq!(summary.inserted, 10);
        assert_eq!(embedder.batch_sizes().await, vec![4, 4, 2]);
        assert_eq!(store.calls().inserts.iter().sum::<usize>(), 10);
        assert!(store.calls().inserts.iter().all(|n| *n <= 3));
    }

    #[tokio::test]
    async fn test_documents_keep_source_order_and_fields() {
        let embedder = MockEmbeddingProvider::new(4);
        let store = MemoryStore::new();
        let orch = orchestrator(embedder.clone(), store.clone()).with_embed_batch_size(2);

        let source = VecRowSource::new(vec![
            Row::new("Seoul", "capital").with_namespace("main"),
            Row::new("Busan", "port").with_contributors("alice,bob"),
            Row::new("Jeju", "island"),
        ]);
        orch.run(&source).await.unwrap();

        let docs = store.documents();
        let titles: Vec<&str> = docs.iter().map(|(_, d)| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Seoul", "Busan", "Jeju"]);
        assert_eq!(docs[0].1.namespace.as_deref(), Some("main"));
        assert_eq!(docs[1].1.contributors.as_deref(), Some("alice,bob"));
        assert_eq!(docs[2].1.embedding, embedder.deterministic_embedding("island"));
    }

    #[tokio::test]
    async fn test_progress_history_recorded_per_cycle() {
        let orch = orchestrator(MockEmbeddingProvider::new(4), MemoryStore::new())
            .with_embed_batch_size(2)
            .with_insert_batch_size(2);
        orch.run(&VecRowSource::new(rows(5))).await.unwrap();

        let history: Vec<(u64, u64)> = orch
            .progress()
            .get()
            .history
            .iter()
            .map(|s| (s.rows_read, s.inserted))
            .collect();
        assert_eq!(history, vec![(2, 2), (4, 4), (5, 5), (5, 5)]);
    }

    // ------------------------------------------------------------------------
    // Failure
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stream_error_marks_error() {
        let store = MemoryStore::new();
        let orch = orchestrator(MockEmbeddingProvider::new(4), store.clone())
            .with_embed_batch_size(2)
            .with_insert_batch_size(2);
        let source = VecRowSource::new(rows(3)).with_failure("stream broke");

        let err = orch.run(&source).await.unwrap_err();
        assert!(matches!(err, Error::Source(ref m) if m == "stream broke"));

        let state = orch.progress().get();
        assert_eq!(state.status, IngestionStatus::Error);
        assert_eq!(state.error_message.as_deref(), Some(err.to_string().as_str()));
        assert!(state.started_at.is_some());
        assert_eq!((state.rows_read, state.inserted), (2, 2));
        assert_eq!(store.calls().inserts, vec![2]);
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts() {
        let store = MemoryStore::new();
        let orch = orchestrator(MockEmbeddingProvider::failing("model offline"), store.clone());

        let err = orch.run(&VecRowSource::new(rows(3))).await.unwrap_err();
        assert!(err.is_embedding_failure());
        assert_eq!(orch.progress().get().status, IngestionStatus::Error);
        assert!(store.calls().inserts.is_empty());
    }

    #[tokio::test]
    async fn test_arity_mismatch_aborts() {
        let orch = orchestrator(MockEmbeddingProvider::empty(), MemoryStore::new());

        let err = orch.run(&VecRowSource::new(rows(2))).await.unwrap_err();
        assert!(matches!(err, Error::ResponseShape { .. }));
        assert_eq!(orch.progress().get().status, IngestionStatus::Error);
    }

    #[tokio::test]
    async fn test_insert_failure_aborts() {
        let store = MemoryStore::new().failing_insert_after(1);
        let orch = orchestrator(MockEmbeddingProvider::new(4), store.clone())
            .with_embed_batch_size(2)
            .with_insert_batch_size(2);

        let err = orch.run(&VecRowSource::new(rows(6))).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        let state = orch.progress().get();
        assert_eq!(state.status, IngestionStatus::Error);
        assert_eq!(state.inserted, 2);
        assert_eq!(store.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_run_rejected_while_running() {
        let embedder = MockEmbeddingProvider::new(4);
        let orch = orchestrator(embedder.clone(), MemoryStore::new());
        orch.progress().try_start().unwrap();
        orch.progress().update(7, 3);
        let before = orch.progress().get();

        let err = orch.run(&VecRowSource::new(rows(2))).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning));
        assert_eq!(*orch.progress().get(), *before);
        assert_eq!(embedder.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_rerun_after_error() {
        let orch = orchestrator(MockEmbeddingProvider::new(4), MemoryStore::new());
        let failing = VecRowSource::new(vec![]).with_failure("nope");
        assert!(orch.run(&failing).await.is_err());

        let summary = orch.run(&VecRowSource::new(rows(1))).await.unwrap();
        assert_eq!(summary.inserted, 1);
        let state = orch.progress().get();
        assert_eq!(state.status, IngestionStatus::Done);
        assert!(state.error_message.is_none());
    }
}
