use crate::embedding::Embedder;
use std::sync::Arc;
use tracing::warn;

/// Cosine similarity between two vectors, in [-1, 1].
/// Mismatched lengths and zero vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    ((dot_product / (magnitude_a * magnitude_b)) as f64).clamp(-1.0, 1.0)
}

/// Rescaled embedding similarity between texts
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Similarity of two texts in [0, 1], computed as `(cos + 1) / 2`.
    ///
    /// Never fails: an empty text, or one the embedder rejects, scores 0.0.
    pub async fn similarity(&self, text_a: &str, text_b: &str) -> f64 {
        if text_a.trim().is_empty() || text_b.trim().is_empty() {
            return 0.0;
        }

        let (a, b) = match (self.embedder.embed(text_a).await, self.embedder.embed(text_b).await) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Embedding failed, scoring similarity as 0: {}", e);
                return 0.0;
            }
        };

        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        (cosine_similarity(&a, &b) + 1.0) / 2.0
    }
}
