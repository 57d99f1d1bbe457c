//! Embedding providers for Namu.
//!
//! This crate defines the `EmbeddingProvider` trait that turns batches of text
//! into fixed-length vectors, plus the implementations the rest of the
//! workspace plugs in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       namu-embed                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── HttpEmbeddingProvider (remote embedding service)       │
//! │  ├── CachingEmbeddingProvider (LRU decorator, single text)  │
//! │  └── MockEmbeddingProvider (deterministic, records calls)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingConfig (endpoint, timeouts, batch and cache size) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use namu_embed::{CachingEmbeddingProvider, EmbeddingConfig, HttpEmbeddingProvider};
//! use std::sync::Arc;
//!
//! let config = EmbeddingConfig::default().with_endpoint("http://localhost:8000/embed");
//! let http = Arc::new(HttpEmbeddingProvider::new(&config)?);
//! let provider = CachingEmbeddingProvider::new(http, config.cache_size);
//!
//! let vector = provider.embed("나무위키").await?;
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod mock;
pub mod provider;

pub use cache::{CachingEmbeddingProvider, DEFAULT_CACHE_CAPACITY};
pub use config::EmbeddingConfig;
pub use http::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;
pub use provider::{EmbeddingProvider, normalize};
