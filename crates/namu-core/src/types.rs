//! Common types shared by ingestion, storage, and search.

use serde::{Deserialize, Serialize};

// ============================================================================
// Ingestion types
// ============================================================================

/// A raw record read from a row source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Article title.
    pub title: String,

    /// Article body.
    pub text: String,

    /// Optional namespace the record belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Optional contributor list, as stored upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<String>,
}

impl Row {
    /// Create a row with a title and body.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            namespace: None,
            contributors: None,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the contributors.
    pub fn with_contributors(mut self, contributors: impl Into<String>) -> Self {
        self.contributors = Some(contributors.into());
        self
    }
}

/// A row paired with its embedding, ready to persist.
///
/// The store assigns the numeric id on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Article title.
    pub title: String,

    /// Article body.
    pub content: String,

    /// Embedding vector.
    pub embedding: Vec<f32>,

    /// Optional namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Optional contributor list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<String>,
}

impl Document {
    /// Build a document from a source row and its embedding.
    pub fn from_row(row: Row, embedding: Vec<f32>) -> Self {
        Self {
            title: row.title,
            content: row.text,
            embedding,
            namespace: row.namespace,
            contributors: row.contributors,
        }
    }
}

// ============================================================================
// Store result rows
// ============================================================================

/// A nearest-neighbor hit from vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Store-assigned id.
    pub id: i64,
    /// Article title.
    pub title: String,
    /// Full article content.
    pub content: String,
    /// Cosine distance to the query vector, in [0, 2].
    pub distance: f64,
}

/// A hit from full-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    /// Store-assigned id.
    pub id: i64,
    /// Article title.
    pub title: String,
    /// Full article content.
    pub content: String,
    /// 1-based lexical rank (1 is the best match).
    pub rank: u32,
}

/// A row already fused and ranked by the store's unified hybrid query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    /// Store-assigned id.
    pub id: i64,
    /// Article title.
    pub title: String,
    /// Full article content.
    pub content: String,
    /// Combined vector and text score.
    pub total_score: f64,
    /// Cosine distance, when the row came through the vector pool.
    pub distance: Option<f64>,
}

// ============================================================================
// Search results
// ============================================================================

/// A ranked search candidate returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Store-assigned id.
    pub id: i64,

    /// Article title.
    pub title: String,

    /// Content truncated for display.
    pub snippet: String,

    /// Similarity in percent, always within [0, 100].
    pub similarity_percent: f64,

    /// Fused score (hybrid search only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Truncate `content` to at most `max_chars` characters, appending `...`
/// when anything was cut.
pub fn snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
