//! Quota computation for multi-source merging.
//!
//! A `MergeQuota` is computed per merge call and never persisted. The
//! fixed strategy hands the first (highest-priority) knowledge base
//! `primary_count` slots and every other KB `secondary_count` slots; the
//! adaptive strategy first inspects each KB's top fused score and shifts
//! slots toward a clearly dominant KB.

use serde::{Deserialize, Serialize};

use crate::candidate::KnowledgeBaseResult;

/// Merge strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    #[default]
    Fixed,
    Adaptive,
}

impl MergeStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "adaptive" => Some(Self::Adaptive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Adaptive => "adaptive",
        }
    }
}

/// Per-call slot allocation for a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeQuota {
    /// Slots for the highest-priority KB.
    pub primary_count: usize,
    /// Slots for each remaining KB.
    pub secondary_count: usize,
    /// Size of the overflow slice filled from all KBs' leftovers.
    pub overflow_count: usize,
}

impl Default for MergeQuota {
    fn default() -> Self {
        Self {
            primary_count: 5,
            secondary_count: 5,
            overflow_count: 5,
        }
    }
}

impl MergeQuota {
    /// Default quota for a strategy. The adaptive strategy starts from the
    /// same split as fixed; the shift happens per call against live scores.
    pub fn default_for(strategy: MergeStrategy) -> Self {
        match strategy {
            MergeStrategy::Fixed | MergeStrategy::Adaptive => Self::default(),
        }
    }
}

/// Knobs for the adaptive quota shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveQuotaParams {
    /// A KB dominates when its top score exceeds every other KB's top
    /// score by more than this ratio.
    pub dominance_ratio: f64,
    /// ... and clears this absolute floor.
    pub dominance_floor: f64,
    /// Multiplier applied to the dominant KB's allocation.
    pub primary_boost: f64,
    /// Multiplier applied to every other KB's allocation.
    pub secondary_damp: f64,
}

impl Default for AdaptiveQuotaParams {
    fn default() -> Self {
        Self {
            dominance_ratio: 1.2,
            dominance_floor: 0.8,
            primary_boost: 1.4,
            secondary_damp: 0.6,
        }
    }
}

/// Compute the per-KB slot allocation for one merge call.
///
/// Returns one allocation per entry in `results`, in the same order. The
/// first KB is primary. Under the adaptive strategy a dominant KB's
/// allocation is boosted and the rest are damped; a KB only counts as
/// dominant when it beats every other KB's top score by
/// `dominance_ratio` and its own top score clears `dominance_floor`.
pub fn allocations(
    quota: &MergeQuota,
    strategy: MergeStrategy,
    adaptive: &AdaptiveQuotaParams,
    results: &[KnowledgeBaseResult],
) -> Vec<usize> {
    let mut allocs: Vec<usize> = results
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i == 0 {
                quota.primary_count
            } else {
                quota.secondary_count
            }
        })
        .collect();

    if strategy != MergeStrategy::Adaptive || results.len() < 2 {
        return allocs;
    }

    let tops: Vec<f64> = results.iter().map(KnowledgeBaseResult::top_score).collect();
    let Some((dominant, &dominant_top)) = tops
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
    else {
        return allocs;
    };

    let runner_up = tops
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != dominant)
        .map(|(_, s)| *s)
        .fold(0.0_f64, f64::max);

    let dominates =
        dominant_top >= adaptive.dominance_floor && dominant_top > adaptive.dominance_ratio * runner_up;

    if dominates {
        tracing::debug!(
            kb = %results[dominant].kb_id,
            top = dominant_top,
            runner_up,
            "adaptive quota shift toward dominant knowledge base"
        );
        for (i, alloc) in allocs.iter_mut().enumerate() {
            let factor = if i == dominant {
                adaptive.primary_boost
            } else {
                adaptive.secondary_damp
            };
            *alloc = ((*alloc as f64) * factor).round() as usize;
        }
    }

    allocs
}
