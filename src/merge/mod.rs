//! N-ary merge of per-knowledge-base hybrid rankings.
//!
//! One merge function parameterized by a list of KB results and a quota,
//! covering any number of sources. Per-KB slot allocation is computed by
//! [`quota::allocations`]; leftovers from every KB compete for a single
//! overflow slice sorted by fused score. Duplicates are dropped keeping the
//! first (highest-priority) occurrence, and the kept set is re-sorted by
//! fused score descending.

pub mod quota;

use std::collections::HashSet;

use itertools::Itertools;

pub use quota::{AdaptiveQuotaParams, MergeQuota, MergeStrategy, allocations};

use crate::candidate::{Candidate, KnowledgeBaseResult, RankedResultSet, sort_by_fused_score};

/// Parameters for one merge call.
#[derive(Debug, Clone)]
pub struct MergeParams {
    pub strategy: MergeStrategy,
    pub quota: MergeQuota,
    pub adaptive: AdaptiveQuotaParams,
    /// Hard cap on output size.
    pub max_results: usize,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::Fixed,
            quota: MergeQuota::default(),
            adaptive: AdaptiveQuotaParams::default(),
            max_results: 50,
        }
    }
}

/// Merge N per-KB rankings into one.
///
/// A KB whose retriever failed contributes an empty result and the merge
/// proceeds with the rest; all KBs empty yields an empty output, not an
/// error. Output invariants: no duplicate `(kb_id, id)` pairs, length at
/// most `max_results`, sorted by fused score descending. Identical inputs
/// always produce identical output.
pub fn merge_sources(results: &[KnowledgeBaseResult], params: &MergeParams) -> Vec<Candidate> {
    if results.iter().all(KnowledgeBaseResult::is_empty) {
        return Vec::new();
    }

    let allocs = allocations(&params.quota, params.strategy, &params.adaptive, results);

    let mut picked: Vec<Candidate> = Vec::new();
    let mut leftovers: Vec<Candidate> = Vec::new();

    for (result, take) in results.iter().zip(allocs.iter()) {
        picked.extend(result.candidates.iter().take(*take).cloned());
        leftovers.extend(result.candidates.iter().skip(*take).cloned());
    }

    // Overflow slice: best leftovers across every KB.
    sort_by_fused_score(&mut leftovers);
    picked.extend(leftovers.into_iter().take(params.quota.overflow_count));

    // Dedup keeping the first (highest-priority) occurrence.
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut kept: Vec<Candidate> = picked
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect();

    sort_by_fused_score(&mut kept);
    kept.truncate(params.max_results);

    tracing::debug!(
        sources = results.len(),
        strategy = %params.strategy.as_str(),
        kept = kept.len(),
        "multi-source merge complete"
    );

    kept
}

/// Drop candidates below the final score threshold, keeping an audit count.
pub fn apply_threshold(candidates: Vec<Candidate>, threshold: f64) -> RankedResultSet {
    let before = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.fused_score >= threshold)
        .collect();

    RankedResultSet {
        below_threshold: before - kept.len(),
        candidates: kept,
    }
}

/// Distinct knowledge base ids present in a merged list, in first-seen order.
pub fn source_ids(candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| c.knowledge_base_id.clone())
        .unique()
        .collect()
}
