//! Brute-force cosine ranking.
//!
//! Every query scans the whole corpus, O(records × dimension). There is no
//! index; this is meant for corpora of a few thousand chunks.

use serde::Serialize;

use super::error::RagError;
use super::store::ChunkRecord;

/// Number of results returned when none is configured.
pub const DEFAULT_TOP_K: usize = 3;

/// A corpus record with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub record: ChunkRecord,
    pub score: f32,
}

/// Cosine similarity of `a` and `b`, accumulated in f64.
///
/// A zero-magnitude vector on either side scores `0.0`. Callers are expected
/// to have checked that both slices have the same length; extra trailing
/// elements of the longer slice are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Score every record against `query` and return the best `k`, highest first.
///
/// Equal scores keep corpus order (lower index first). A record whose
/// embedding length differs from the query's is rejected with
/// [`RagError::DimensionMismatch`].
pub fn rank(
    query: &[f32],
    records: &[ChunkRecord],
    k: usize,
) -> Result<Vec<RankedResult>, RagError> {
    let mut scored = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if record.embedding.len() != query.len() {
            return Err(RagError::DimensionMismatch {
                expected: query.len(),
                actual: record.embedding.len(),
            });
        }
        scored.push((idx, cosine_similarity(query, &record.embedding)));
    }

    scored.sort_by(|left, right| {
        right
            .1
            .total_cmp(&left.1)
            .then_with(|| left.0.cmp(&right.0))
    });

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(idx, score)| RankedResult {
            record: records[idx].clone(),
            score,
        })
        .collect())
}
