//! In-memory retrieval store.
//!
//! Brute-force cosine scan and substring matching over documents held in a
//! `Vec`. Used for tests, demos, and running without a database. Each query
//! can be made to fail on demand, and every call is recorded.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::store::RetrievalStore;
use namu_core::scoring::DEFAULT_RRF_K;
use namu_core::{
    Document, Error, FusedHit, FusionAccumulator, FusionWeights, Result, TextHit, VectorHit,
};

/// Calls received by a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCalls {
    /// Size of every `insert_batch` call, in order.
    pub inserts: Vec<usize>,
    /// Number of `count` calls.
    pub count: usize,
    /// Number of vector searches.
    pub vector: usize,
    /// Number of full-text searches.
    pub full_text: usize,
    /// Number of unified hybrid searches.
    pub unified: usize,
    /// Number of explain calls of any kind.
    pub explain: usize,
}

impl StoreCalls {
    /// Total calls of any kind.
    pub fn total(&self) -> usize {
        self.inserts.len() + self.count + self.vector + self.full_text + self.unified + self.explain
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    insert_after: Option<usize>,
    count: bool,
    vector: bool,
    full_text: bool,
    unified: bool,
    explain: bool,
}

#[derive(Default)]
struct MemoryState {
    documents: Vec<(i64, Document)>,
    calls: StoreCalls,
}

/// A retrieval store held entirely in memory.
///
/// Clones share the same documents and call log.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Faults,
    unified: bool,
    rrf_k: u32,
    unified_candidates: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with unified hybrid search enabled.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            faults: Faults::default(),
            unified: true,
            rrf_k: DEFAULT_RRF_K,
            unified_candidates: 60,
        }
    }

    /// Seed the store with documents (not recorded as insert calls).
    pub fn with_documents(self, documents: impl IntoIterator<Item = Document>) -> Self {
        {
            let mut state = self.lock();
            for doc in documents {
                let id = state.documents.len() as i64 + 1;
                state.documents.push((id, doc));
            }
        }
        self
    }

    /// Enable or disable the unified hybrid path.
    pub fn with_unified_hybrid(mut self, enabled: bool) -> Self {
        self.unified = enabled;
        self
    }

    /// Set the reciprocal-rank constant used by the unified path.
    pub fn with_rrf_k(mut self, k: u32) -> Self {
        self.rrf_k = k;
        self
    }

    /// Set the per-signal candidate pool of the unified path.
    pub fn with_unified_candidates(mut self, candidates: usize) -> Self {
        self.unified_candidates = candidates;
        self
    }

    /// Fail every insert after the first `n` succeed.
    pub fn failing_insert_after(mut self, n: usize) -> Self {
        self.faults.insert_after = Some(n);
        self
    }

    /// Fail every `count` call.
    pub fn failing_count(mut self) -> Self {
        self.faults.count = true;
        self
    }

    /// Fail every vector search.
    pub fn failing_vector(mut self) -> Self {
        self.faults.vector = true;
        self
    }

    /// Fail every full-text search.
    pub fn failing_full_text(mut self) -> Self {
        self.faults.full_text = true;
        self
    }

    /// Fail every unified hybrid search.
    pub fn failing_unified(mut self) -> Self {
        self.faults.unified = true;
        self
    }

    /// Fail every explain call.
    pub fn failing_explain(mut self) -> Self {
        self.faults.explain = true;
        self
    }

    /// Snapshot of the calls received so far.
    pub fn calls(&self) -> StoreCalls {
        self.lock().calls.clone()
    }

    /// Snapshot of stored documents with their ids.
    pub fn documents(&self) -> Vec<(i64, Document)> {
        self.lock().documents.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn vector_hits(state: &MemoryState, embedding: &[f32], limit: usize) -> Vec<VectorHit> {
        let mut hits: Vec<VectorHit> = state
            .documents
            .iter()
            .filter_map(|(id, doc)| {
                cosine_distance(embedding, &doc.embedding).map(|distance| VectorHit {
                    id: *id,
                    title: doc.title.clone(),
                    content: doc.content.clone(),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        hits
    }

    fn text_hits(state: &MemoryState, query: &str, limit: usize) -> Vec<TextHit> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, i64, &Document)> = state
            .documents
            .iter()
            .filter_map(|(id, doc)| {
                let haystack = format!("{} {}", doc.title, doc.content).to_lowercase();
                let score: usize = terms.iter().map(|t| haystack.matches(t.as_str()).count()).sum();
                (score > 0).then_some((score, *id, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(limit);

        scored
            .into_iter()
            .zip(1u32..)
            .map(|((_, id, doc), rank)| TextHit {
                id,
                title: doc.title.clone(),
                content: doc.content.clone(),
                rank,
            })
            .collect()
    }
}

/// Cosine distance in [0, 2], or `None` for mismatched or zero vectors.
fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0))
}

fn plan(operation: &str) -> String {
    serde_json::json!([{ "Plan": { "Node Type": "Memory Scan", "Operation": operation } }])
        .to_string()
}

#[async_trait]
impl RetrievalStore for MemoryStore {
    async fn insert_batch(&self, documents: &[Document]) -> Result<()> {
        let mut state = self.lock();
        state.calls.inserts.push(documents.len());
        if let Some(limit) = self.faults.insert_after
            && state.calls.inserts.len() > limit
        {
            return Err(Error::store("insert rejected"));
        }
        for doc in documents {
            let id = state.documents.len() as i64 + 1;
            state.documents.push((id, doc.clone()));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let mut state = self.lock();
        state.calls.count += 1;
        if self.faults.count {
            return Err(Error::store("count unavailable"));
        }
        Ok(state.documents.len() as u64)
    }

    async fn search_by_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        let mut state = self.lock();
        state.calls.vector += 1;
        if self.faults.vector {
            return Err(Error::store("vector search unavailable"));
        }
        Ok(Self::vector_hits(&state, embedding, limit))
    }

    async fn search_by_full_text(&self, query: &str, limit: usize) -> Result<Vec<TextHit>> {
        let mut state = self.lock();
        state.calls.full_text += 1;
        if self.faults.full_text {
            return Err(Error::store("full-text search unavailable"));
        }
        Ok(Self::text_hits(&state, query, limit))
    }

    fn supports_unified_hybrid(&self) -> bool {
        self.unified
    }

    async fn search_by_unified_hybrid(
        &self,
        embedding: &[f32],
        query: &str,
        limit: usize,
        weights: FusionWeights,
    ) -> Result<Vec<FusedHit>> {
        let mut state = self.lock();
        state.calls.unified += 1;
        if !self.unified || self.faults.unified {
            return Err(Error::store("unified hybrid search unavailable"));
        }
        let mut acc = FusionAccumulator::new(weights, self.rrf_k);
        acc.add_vector_hits(&Self::vector_hits(&state, embedding, self.unified_candidates));
        acc.add_text_hits(&Self::text_hits(&state, query, self.unified_candidates));
        Ok(acc.into_ranked(limit))
    }

    async fn explain_vector(&self, _embedding: &[f32], _limit: usize) -> Result<String> {
        self.explain("vector")
    }

    async fn explain_full_text(&self, _query: &str, _limit: usize) -> Result<String> {
        self.explain("full-text")
    }

    async fn explain_unified_hybrid(
        &self,
        _embedding: &[f32],
        _query: &str,
        _limit: usize,
        _weights: FusionWeights,
    ) -> Result<String> {
        self.explain("unified")
    }

    fn vector_sql(&self, limit: usize) -> String {
        format!(
            "SELECT id, title, content, cosine_distance(embedding, $1) AS dist\n\
             FROM memory\nORDER BY dist\nLIMIT {limit}"
        )
    }

    fn full_text_sql(&self, query: &str, limit: usize) -> String {
        format!(
            "SELECT id, title, content, rank\nFROM memory\nWHERE text MATCHES '{}'\nLIMIT {limit}",
            query.replace('\'', "''")
        )
    }

    fn unified_hybrid_sql(&self, query: &str, limit: usize, weights: FusionWeights) -> String {
        format!(
            "FUSE (vector LIMIT {pool}, text '{q}' LIMIT {pool})\n\
             WEIGHTS semantic={s}, keyword={kw}, k={k}\nLIMIT {limit}",
            pool = self.unified_candidates,
            q = query.replace('\'', "''"),
            s = weights.semantic,
            kw = weights.keyword,
            k = self.rrf_k,
        )
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl MemoryStore {
    fn explain(&self, operation: &str) -> Result<String> {
        let mut state = self.lock();
        state.calls.explain += 1;
        if self.faults.explain {
            return Err(Error::store("explain unavailable"));
        }
        Ok(plan(operation))
    }
}

// ============================================================================
// Tests
// ============================================================================
