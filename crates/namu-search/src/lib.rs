//! Search for Namu.
//!
//! Two entry points share one embedding provider and one retrieval store:
//!
//! - [`VectorSearch`]: nearest-neighbor search with a lexical relevance gate
//! - [`HybridSearchEngine`]: weighted fusion of vector and full-text signals
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      HybridSearchEngine                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  query ──▶ EmbeddingProvider ──▶ embedding (optional)        │
//! │                                                              │
//! │  unified path:    RetrievalStore::search_by_unified_hybrid   │
//! │  decomposed path: vector ∥ vector explain ∥ text ∥ text      │
//! │                   explain, merged by FusionAccumulator       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  results + generated SQL + merged EXPLAIN diagnostics        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod hybrid;
pub mod vector;

pub use config::SearchConfig;
pub use hybrid::{
    HybridSearchEngine, HybridSearchOutcome, HybridSearchRequest, MAX_LIMIT, merge_explanations,
};
pub use vector::{VectorSearch, passes_lexical_gate};
