//! Hybrid fusion scoring.
//!
//! The in-process fusion path and the store's pushed-down unified query both
//! score candidates with the formulas below. The SQL renderers in this module
//! emit the same arithmetic so the two paths cannot drift apart.
//!
//! # Algorithm
//!
//! Vector signal, from cosine distance `d` (unit vectors, so `d` is in [0, 2]):
//!
//! `similarity(d) = (2 - clamp(d, 0, 2)) / 2`
//!
//! Text signal, from a 1-based lexical rank `r` and constant `k` (default 60):
//!
//! `text(r) = 1/(k + r) * (k + 1)`
//!
//! The `(k + 1)` factor rescales rank 1 to exactly 1.0, matching the vector
//! signal's maximum. A document's total score is
//! `semantic_weight * similarity(d) + keyword_weight * text(r)`, with a missing
//! signal contributing nothing.

/// Default reciprocal-rank constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Display distance for documents that only the text signal found (50%).
pub const NEUTRAL_DISTANCE: f64 = 1.0;

/// Keyword weight used when the caller supplied NaN.
const DEFAULT_KEYWORD_WEIGHT: f64 = 0.5;

// ============================================================================
// Weights
// ============================================================================

/// Keyword and semantic weights, always summing to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    /// Weight applied to the vector similarity.
    pub semantic: f64,
    /// Weight applied to the rescaled text rank.
    pub keyword: f64,
}

impl FusionWeights {
    /// Derive both weights from a keyword weight, clamped to [0, 1].
    pub fn from_keyword_weight(keyword_weight: f64) -> Self {
        let keyword = if keyword_weight.is_nan() {
            DEFAULT_KEYWORD_WEIGHT
        } else {
            keyword_weight.clamp(0.0, 1.0)
        };
        Self {
            semantic: 1.0 - keyword,
            keyword,
        }
    }
}

// ============================================================================
// Rust formulas
// ============================================================================

/// Map a cosine distance onto a [0, 1] similarity. Non-finite input yields 0.
pub fn vector_similarity(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 0.0;
    }
    (2.0 - distance.clamp(0.0, 2.0)) / 2.0
}

/// Weighted vector contribution to a fused score.
pub fn vector_contribution(distance: f64, semantic_weight: f64) -> f64 {
    semantic_weight * vector_similarity(distance)
}

/// Reciprocal rank rescaled so that rank 1 scores 1.0.
pub fn rescaled_reciprocal_rank(rank: u32, k: u32) -> f64 {
    let k = f64::from(k);
    1.0 / (k + f64::from(rank)) * (k + 1.0)
}

/// Weighted text contribution to a fused score.
pub fn text_contribution(rank: u32, k: u32, keyword_weight: f64) -> f64 {
    keyword_weight * rescaled_reciprocal_rank(rank, k)
}

/// Similarity percent for display, always within [0, 100].
pub fn similarity_percent(distance: f64) -> f64 {
    let percent = vector_similarity(distance) * 100.0;
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

// ============================================================================
// SQL renderers
// ============================================================================

/// SQL expression for [`vector_contribution`].
///
/// `distance` and `semantic_weight` are SQL expressions (columns or
/// placeholders). Yields NULL when `distance` is NULL.
pub fn vector_contribution_sql(distance: &str, semantic_weight: &str) -> String {
    format!("({semantic_weight} * (2.0 - LEAST(GREATEST({distance}, 0.0), 2.0)) / 2.0)")
}

/// SQL expression for [`text_contribution`]. Yields NULL when `rank` is NULL.
pub fn text_contribution_sql(rank: &str, k: u32, keyword_weight: &str) -> String {
    format!("({keyword_weight} * (1.0 / ({k}.0 + {rank})) * ({k}.0 + 1.0))")
}

/// SQL expression for the total fused score, treating a missing signal as 0.
pub fn fused_score_sql(
    distance: &str,
    rank: &str,
    k: u32,
    semantic_weight: &str,
    keyword_weight: &str,
) -> String {
    format!(
        "COALESCE({}, 0.0) + COALESCE({}, 0.0)",
        vector_contribution_sql(distance, semantic_weight),
        text_contribution_sql(rank, k, keyword_weight)
    )
}

// ============================================================================
// Tests
// ============================================================================
