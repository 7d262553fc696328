//! Similarity & Retrieval (spec.md §4.C4).
//!
//! Ranks a candidate set of [`Interaction`]s against a query embedding and
//! concept set, combining cosine similarity (scaled to a 0-100 band),
//! concept overlap, and each candidate's decay factor into a single score.

use crate::embeddings::cosine_similarity;
use crate::types::Interaction;

/// One scored retrieval result.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub interaction: Interaction,
    pub score: f32,
}

/// Rank `candidates` against `query_embedding`/`query_concepts`, keep those
/// at or above `threshold`, and return at most `limit` — highest score
/// first, ties broken by input order (stable sort).
///
/// Returns empty immediately if `query_embedding` is all-zero (no direction
/// to compare against). A candidate whose embedding length doesn't match
/// `query_embedding`'s is skipped and logged rather than failing the whole
/// call.
#[must_use]
pub fn retrieve(
    query_embedding: &[f32],
    query_concepts: &[String],
    candidates: &[Interaction],
    threshold: f32,
    limit: usize,
    concept_weight: f32,
) -> Vec<RankedCandidate> {
    if query_embedding.iter().all(|&x| x == 0.0) {
        return Vec::new();
    }

    let mut scored: Vec<RankedCandidate> = candidates
        .iter()
        .filter_map(|candidate| {
            if candidate.embedding.len() != query_embedding.len() {
                tracing::warn!(
                    interaction_id = %candidate.id,
                    expected = query_embedding.len(),
                    got = candidate.embedding.len(),
                    "skipping candidate with mismatched embedding length"
                );
                return None;
            }

            if candidate.embedding.iter().all(|&x| x == 0.0) {
                // lazy tell: no direction to compare, reachable only via keyword fallback.
                return None;
            }

            let cos = cosine_similarity(query_embedding, &candidate.embedding);
            let cos_band = 100.0 * (cos + 1.0) / 2.0;

            let overlap = query_concepts
                .iter()
                .filter(|c| candidate.concepts.contains(*c))
                .count();
            let concept_boost = if query_concepts.is_empty() {
                0.0
            } else {
                (overlap as f32 / query_concepts.len().max(1) as f32) * concept_weight
            };

            let score = (cos_band + concept_boost) * candidate.decay_factor;
            Some(RankedCandidate {
                interaction: candidate.clone(),
                score,
            })
        })
        .filter(|ranked| ranked.score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
