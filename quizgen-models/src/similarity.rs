//! Cosine similarity over embedding vectors.

use crate::{Error, Result};

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. Mismatched
/// or empty dimensions, zero-magnitude vectors and non-finite results are
/// reported as [`Error::InvalidEmbedding`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::InvalidEmbedding(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(Error::InvalidEmbedding("empty embedding vector".to_string()));
    }

    // f64 accumulators; the result is still clamped to [-1, 1].
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::InvalidEmbedding(
            "zero-magnitude embedding vector".to_string(),
        ));
    }

    let similarity = dot / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Err(Error::InvalidEmbedding(format!(
            "similarity is not finite: {similarity}"
        )));
    }

    Ok(similarity.clamp(-1.0, 1.0) as f32)
}
