//! Cosine-similarity ranking of indexed chunks against a query vector.
//!
//! Pure, non-blocking computation: scores every candidate, sorts
//! descending, truncates to `k`. Ties keep input order (stable sort), so
//! identical inputs always produce identical rankings.

use contextmill_core::error::IndexError;
use contextmill_core::Chunk;

use crate::store::IndexedChunk;

/// A `(chunk, score)` pair produced fresh per query. Never persisted.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]; higher is better.
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal,
/// -1 = opposite. Returns 0.0 if either vector has zero norm.
/// Callers are expected to have checked dimensionality already.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank candidates by cosine similarity to the query, descending.
///
/// Returns at most `k` results; fewer when fewer candidates exist, and an
/// empty list for an empty candidate set (a normal state, not a failure).
/// A dimensionality mismatch between the query and any candidate is a
/// data error and is reported rather than scored.
pub fn rank(
    query: &[f32],
    candidates: &[IndexedChunk],
    k: usize,
) -> Result<Vec<RankedChunk>, IndexError> {
    for candidate in candidates {
        if candidate.embedding.len() != query.len() {
            return Err(IndexError::DimensionMismatch {
                expected: query.len(),
                actual: candidate.embedding.len(),
            });
        }
    }

    let mut scored: Vec<RankedChunk> = candidates
        .iter()
        .map(|c| RankedChunk {
            chunk: c.chunk.clone(),
            score: cosine_similarity(query, &c.embedding),
        })
        .collect();

    // Stable sort: equal scores keep candidate input order.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);

    Ok(scored)
}
