//! Search configuration.

use serde::{Deserialize, Serialize};

use namu_core::scoring::DEFAULT_RRF_K;

/// Tuning knobs and display placeholders for both search paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Text search configuration name used by the store (e.g. `simple`).
    #[serde(default = "default_fulltext_config")]
    pub fulltext_config: String,

    /// Reciprocal-rank constant for the text signal.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    /// Vector candidates fetched by the decomposed path.
    #[serde(default = "default_candidates")]
    pub vector_candidates: usize,

    /// Text candidates fetched by the decomposed path.
    #[serde(default = "default_candidates")]
    pub text_candidates: usize,

    /// Per-signal candidates used by the store's unified query.
    #[serde(default = "default_unified_candidates")]
    pub unified_candidates: usize,

    /// Queries are truncated to this many characters before embedding.
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    /// Characters of content shown per result.
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,

    /// Plain vector results below this similarity are dropped.
    #[serde(default = "default_min_similarity_percent")]
    pub min_similarity_percent: f64,

    /// Generated SQL reported for a blank query.
    #[serde(default)]
    pub empty_sql_placeholder: String,

    /// Diagnostics reported when no plan is available.
    #[serde(default = "default_empty_explanation_placeholder")]
    pub empty_explanation_placeholder: String,

    /// Generated SQL reported when no signal is selected.
    #[serde(default = "default_no_search_sql_placeholder")]
    pub no_search_sql_placeholder: String,
}

fn default_fulltext_config() -> String {
    "simple".to_string()
}

fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}

fn default_candidates() -> usize {
    50
}

fn default_unified_candidates() -> usize {
    60
}

fn default_max_query_length() -> usize {
    512
}

fn default_snippet_length() -> usize {
    500
}

fn default_min_similarity_percent() -> f64 {
    55.0
}

fn default_empty_explanation_placeholder() -> String {
    "[]".to_string()
}

fn default_no_search_sql_placeholder() -> String {
    "-- no search signal selected".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fulltext_config: default_fulltext_config(),
            rrf_k: default_rrf_k(),
            vector_candidates: default_candidates(),
            text_candidates: default_candidates(),
            unified_candidates: default_unified_candidates(),
            max_query_length: default_max_query_length(),
            snippet_length: default_snippet_length(),
            min_similarity_percent: default_min_similarity_percent(),
            empty_sql_placeholder: String::new(),
            empty_explanation_placeholder: default_empty_explanation_placeholder(),
            no_search_sql_placeholder: default_no_search_sql_placeholder(),
        }
    }
}
