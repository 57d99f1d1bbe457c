//! Score fusion across vector and full-text hits.
//!
//! Accumulates weighted contributions per document id using the formulas in
//! [`crate::scoring`]. A document found by both signals gets the sum of both
//! contributions under its single id.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::scoring::{FusionWeights, text_contribution, vector_contribution};
use crate::types::{FusedHit, TextHit, VectorHit};

#[derive(Debug, Clone)]
struct Entry {
    title: String,
    content: String,
    score: f64,
    distance: Option<f64>,
}

/// Per-id score accumulator for hybrid ranking.
#[derive(Debug, Clone)]
pub struct FusionAccumulator {
    weights: FusionWeights,
    k: u32,
    entries: HashMap<i64, Entry>,
}

impl FusionAccumulator {
    /// Create an empty accumulator.
    pub fn new(weights: FusionWeights, k: u32) -> Self {
        Self {
            weights,
            k,
            entries: HashMap::new(),
        }
    }

    /// Number of distinct documents seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no documents have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add vector hits, each contributing `semantic * similarity(distance)`.
    pub fn add_vector_hits(&mut self, hits: &[VectorHit]) {
        for hit in hits {
            let contribution = vector_contribution(hit.distance, self.weights.semantic);
            let entry = self.entry(hit.id, &hit.title, &hit.content);
            entry.score += contribution;
            entry.distance = Some(match entry.distance {
                Some(seen) => seen.min(hit.distance),
                None => hit.distance,
            });
        }
    }

    /// Add text hits, each contributing the rescaled reciprocal rank.
    pub fn add_text_hits(&mut self, hits: &[TextHit]) {
        for hit in hits {
            let contribution = text_contribution(hit.rank, self.k, self.weights.keyword);
            self.entry(hit.id, &hit.title, &hit.content).score += contribution;
        }
    }

    fn entry(&mut self, id: i64, title: &str, content: &str) -> &mut Entry {
        self.entries.entry(id).or_insert_with(|| Entry {
            title: title.to_string(),
            content: content.to_string(),
            score: 0.0,
            distance: None,
        })
    }

    /// Rank by total score descending (ties by id ascending) and keep `limit`.
    pub fn into_ranked(self, limit: usize) -> Vec<FusedHit> {
        let mut hits: Vec<FusedHit> = self
            .entries
            .into_iter()
            .map(|(id, entry)| FusedHit {
                id,
                title: entry.title,
                content: entry.content,
                total_score: entry.score,
                distance: entry.distance,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        hits
    }
}

// ============================================================================
// Tests
// ============================================================================
