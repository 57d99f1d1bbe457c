//! LRU caching decorator for embedding providers.
//!
//! Only single-text batches are cached. Interactive searches embed one query
//! at a time and repeat often; ingestion batches rarely repeat, so multi-text
//! batches always go straight to the delegate.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::provider::EmbeddingProvider;
use namu_core::Result;

/// Default number of cached query embeddings.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Embedding provider that caches single-text results in a bounded LRU.
pub struct CachingEmbeddingProvider {
    delegate: Arc<dyn EmbeddingProvider>,
    cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

impl CachingEmbeddingProvider {
    /// Wrap `delegate` with a cache of `capacity` entries.
    ///
    /// A capacity of 0 disables caching entirely.
    pub fn new(delegate: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        Self {
            delegate,
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.lock().await.len(),
            None => 0,
        }
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EmbeddingProvider for CachingEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (Some(cache), [text]) = (&self.cache, texts) else {
            return self.delegate.embed_batch(texts).await;
        };

        if let Some(hit) = cache.lock().await.get(text) {
            tracing::debug!(provider = self.delegate.name(), "embedding cache hit");
            return Ok(vec![hit.clone()]);
        }

        // The lock is released while the delegate runs; concurrent misses on
        // the same text both call through and the last write wins.
        let vectors = self.delegate.embed_batch(texts).await?;
        if let Some(vector) = vectors.first() {
            cache.lock().await.put(text.clone(), vector.clone());
        }
        Ok(vectors)
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }
}

// ============================================================================
// Tests
// ============================================================================
