//! Mock embedding provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::provider::EmbeddingProvider;
use namu_core::{Error, Result};

/// A mock embedding provider.
///
/// Generates deterministic unit vectors from the input bytes and records
/// every batch it receives. Clones share the same call log, so a test can
/// hand one clone to the code under test and inspect the other.
#[derive(Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    batches: Vec<Vec<String>>,
    failure: Option<String>,
    empty: bool,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a provider whose every call fails with a remote service error.
    pub fn failing(message: impl Into<String>) -> Self {
        let provider = Self::new(8);
        let state = MockState {
            failure: Some(message.into()),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            ..provider
        }
    }

    /// Create a provider that answers every call with no vectors.
    pub fn empty() -> Self {
        let state = MockState {
            empty: true,
            ..MockState::default()
        };
        Self {
            dimension: 8,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Number of `embed_batch` calls received.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.batches.len()
    }

    /// Size of every batch received, in call order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().await.batches.iter().map(Vec::len).collect()
    }

    /// Every batch received, in call order.
    pub async fn batches(&self) -> Vec<Vec<String>> {
        self.state.lock().await.batches.clone()
    }

    /// Generate a deterministic embedding from text.
    pub fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        let mut embedding: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let byte_val = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
                ((byte_val as f32 + i as f32 + 1.0) % 256.0) / 256.0
            })
            .collect();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut state = self.state.lock().await;
        state.batches.push(texts.to_vec());

        if let Some(message) = &state.failure {
            return Err(Error::remote(500, message.clone()));
        }
        if state.empty {
            return Ok(Vec::new());
        }
        Ok(texts
            .iter()
            .map(|t| self.deterministic_embedding(t))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================
