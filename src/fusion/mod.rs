//! Weighted Reciprocal Rank Fusion for hybrid retrieval.
//!
//! Combines a lexical (sparse, BM25-style) ranked list with a vector
//! (dense, embedding-similarity) ranked list without normalizing scores
//! across the two systems.
//!
//! ## Algorithm
//!
//! RRF score for candidate c:
//! ```text
//! RRF(c) = vector_weight / (k + vector_rank(c)) + lexical_weight / (k + lexical_rank(c))
//! ```
//!
//! Each term is present only if c appears in that list. A candidate found
//! only by the lexical retriever whose dense score is missing or below
//! `min_dense_score` gets the salvage rule:
//!
//! ```text
//! RRF(c) = max(lexical_weight / (k + lexical_rank(c)), lexical_raw(c) * salvage_factor)
//! ```
//!
//! which keeps strong exact-term matches from being crowded out by a
//! rank-only formula. Output is sorted descending by fused score, ties
//! broken by candidate id. The function is pure and O(n log n).

use std::collections::HashMap;

use crate::candidate::{Candidate, Provenance, sort_by_fused_score};

/// Fusion parameters.
#[derive(Debug, Clone)]
pub struct FusionParams {
    /// Smoothing constant (default: 60). Higher values reduce the impact
    /// of rank differences.
    pub k: f64,
    /// Weight for dense (vector) results.
    pub vector_weight: f64,
    /// Weight for sparse (lexical) results.
    pub lexical_weight: f64,
    /// Multiplier on the raw lexical score in the salvage rule.
    /// Empirically tuned; not a load-bearing guarantee.
    pub salvage_factor: f64,
    /// Minimal-validity threshold for a dense score. At or below this the
    /// dense signal is treated as absent and salvage applies.
    pub min_dense_score: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            k: 60.0,
            vector_weight: 0.7,
            lexical_weight: 0.3,
            salvage_factor: 0.1,
            min_dense_score: 1e-6,
        }
    }
}

impl FusionParams {
    pub fn with_weights(vector_weight: f64, lexical_weight: f64) -> Self {
        Self {
            vector_weight,
            lexical_weight,
            ..Default::default()
        }
    }
}

/// Fuse a vector-ranked list and a lexical-ranked list into one ranking.
///
/// Both inputs are expected sorted by their own score descending; ranks are
/// assigned 1-based from list position. Raw per-source scores already on
/// the input candidates are preserved. If one input is empty the other is
/// returned converted to rank-scores under its own weight; both empty
/// yields an empty list.
pub fn fuse(vector: &[Candidate], lexical: &[Candidate], params: &FusionParams) -> Vec<Candidate> {
    let mut merged: HashMap<String, Candidate> = HashMap::new();

    for (rank, candidate) in vector.iter().enumerate() {
        let rank = rank + 1;
        let contribution = params.vector_weight / (params.k + rank as f64);

        merged
            .entry(candidate.id.clone())
            .and_modify(|c| {
                c.fused_score += contribution;
                c.vector_rank = Some(rank);
                c.vector_score = candidate.vector_score;
                c.provenance.push(Provenance::Vector);
            })
            .or_insert_with(|| {
                let mut c = candidate.clone();
                c.fused_score = contribution;
                c.vector_rank = Some(rank);
                c.provenance = vec![Provenance::Vector];
                c
            });
    }

    for (rank, candidate) in lexical.iter().enumerate() {
        let rank = rank + 1;
        let contribution = params.lexical_weight / (params.k + rank as f64);

        merged
            .entry(candidate.id.clone())
            .and_modify(|c| {
                c.fused_score += contribution;
                c.lexical_rank = Some(rank);
                c.lexical_score = candidate.lexical_score;
                c.provenance.push(Provenance::Lexical);
            })
            .or_insert_with(|| {
                let mut c = candidate.clone();
                c.fused_score = contribution;
                c.lexical_rank = Some(rank);
                c.provenance = vec![Provenance::Lexical];
                c
            });
    }

    // Salvage pass: lexical-only candidates without a valid dense score.
    for c in merged.values_mut() {
        let dense_valid = c.vector_score.is_some_and(|s| s > params.min_dense_score);
        if c.vector_rank.is_none() && !dense_valid {
            if let Some(raw) = c.lexical_score {
                let salvaged = raw * params.salvage_factor;
                if salvaged > c.fused_score {
                    c.fused_score = salvaged;
                    c.provenance.push(Provenance::LexicalSalvaged);
                }
            }
        }
    }

    let mut results: Vec<Candidate> = merged.into_values().collect();
    sort_by_fused_score(&mut results);
    results
}
