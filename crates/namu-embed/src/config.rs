//! Embedding client configuration.

use serde::{Deserialize, Serialize};

/// Embedding service configuration.
///
/// Controls the remote endpoint, request shaping, and batching behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// URL the client POSTs `{"texts": [...]}` to.
    #[serde(default)]
    pub endpoint_url: String,

    /// Optional bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Number of rows embedded per ingestion batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Texts longer than this many characters are truncated before sending.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// LRU capacity for single-text lookups (0 disables the cache).
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_text_length() -> usize {
    8192
}

fn default_cache_size() -> usize {
    crate::cache::DEFAULT_CACHE_CAPACITY
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: None,
            batch_size: default_batch_size(),
            timeout_seconds: default_timeout_seconds(),
            max_text_length: default_max_text_length(),
            cache_size: default_cache_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
