//! The embedding provider trait.

use async_trait::async_trait;
use namu_core::{Error, Result};

/// Trait for generating text embeddings.
///
/// Implementations must be arity-preserving: `embed_batch` returns exactly
/// one vector per input text, in input order. Returned vectors are expected
/// to be unit-normalized so that cosine distance stays within [0, 2].
///
/// The trait requires `Send + Sync` so providers can be shared across
/// ingestion and search tasks behind an `Arc`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    ///
    /// Returns `None` when the provider produced no vector.
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        Ok(vectors.into_iter().next())
    }

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// Scale `vector` to unit length in place.
///
/// Fails with a response shape error for empty, zero, or non-finite vectors,
/// since those have no direction.
pub fn normalize(vector: &mut [f32]) -> Result<()> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if vector.is_empty() || !norm.is_finite() || norm == 0.0 {
        return Err(Error::response_shape(
            "a non-zero finite vector",
            format!("vector of length {} with norm {norm}", vector.len()),
        ));
    }
    for val in vector.iter_mut() {
        *val /= norm;
    }
    Ok(())
}

/// Check that a provider returned one vector per input text.
pub(crate) fn ensure_arity(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::response_shape(
            format!("{expected} embeddings"),
            format!("{actual} embeddings"),
        ));
    }
    Ok(())
}
