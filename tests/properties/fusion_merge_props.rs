//! Property-based tests for fusion and merge invariants.

use std::collections::HashSet;

use proptest::prelude::*;

use qfuse::candidate::{Candidate, KnowledgeBaseResult};
use qfuse::fusion::{FusionParams, fuse};
use qfuse::merge::{MergeParams, MergeQuota, MergeStrategy, apply_threshold, merge_sources};

/// A ranked list: distinct candidate indices paired with descending scores.
fn arb_ranked_list(max_len: usize) -> impl Strategy<Value = Vec<(usize, f64)>> {
    prop::collection::btree_set(0..40usize, 0..max_len).prop_flat_map(|ids| {
        let len = ids.len();
        let ids: Vec<usize> = ids.into_iter().collect();
        prop::collection::vec(0.001..1.0f64, len).prop_map(move |mut scores| {
            scores.sort_by(|a, b| b.partial_cmp(a).unwrap());
            ids.iter().copied().zip(scores).collect()
        })
    })
}

fn vector_list(entries: &[(usize, f64)]) -> Vec<Candidate> {
    entries
        .iter()
        .map(|(i, score)| {
            let mut c = Candidate::new(format!("c{i:02}"), format!("text {i}"), "kb");
            c.vector_score = Some(*score);
            c
        })
        .collect()
}

fn lexical_list(entries: &[(usize, f64)]) -> Vec<Candidate> {
    entries
        .iter()
        .map(|(i, score)| {
            let mut c = Candidate::new(format!("c{i:02}"), format!("text {i}"), "kb");
            c.lexical_score = Some(*score);
            c
        })
        .collect()
}

fn arb_kb_results() -> impl Strategy<Value = Vec<KnowledgeBaseResult>> {
    prop::collection::vec(arb_ranked_list(20), 1..5).prop_map(|lists| {
        lists
            .into_iter()
            .enumerate()
            .map(|(kb_index, entries)| {
                let kb_id = format!("kb_{kb_index}");
                let candidates = entries
                    .iter()
                    .enumerate()
                    .map(|(pos, (i, _))| {
                        let mut c =
                            Candidate::new(format!("c{i:02}"), format!("text {i}"), kb_id.clone());
                        c.fused_score = 1.0 - pos as f64 * 0.01;
                        c
                    })
                    .collect();
                KnowledgeBaseResult::new(kb_id, candidates)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn fuse_output_is_union_without_duplicates(
        vec_entries in arb_ranked_list(20),
        lex_entries in arb_ranked_list(20),
    ) {
        let vector = vector_list(&vec_entries);
        let lexical = lexical_list(&lex_entries);

        let fused = fuse(&vector, &lexical, &FusionParams::default());

        let union: HashSet<&str> = vector
            .iter()
            .chain(lexical.iter())
            .map(|c| c.id.as_str())
            .collect();
        prop_assert_eq!(fused.len(), union.len());

        let mut seen = HashSet::new();
        for c in &fused {
            prop_assert!(seen.insert(c.id.clone()), "duplicate id {}", c.id);
        }
    }

    #[test]
    fn fuse_output_sorted_descending(
        vec_entries in arb_ranked_list(20),
        lex_entries in arb_ranked_list(20),
    ) {
        let fused = fuse(
            &vector_list(&vec_entries),
            &lexical_list(&lex_entries),
            &FusionParams::default(),
        );

        for pair in fused.windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
        }
    }

    #[test]
    fn fuse_is_pure(
        vec_entries in arb_ranked_list(12),
        lex_entries in arb_ranked_list(12),
    ) {
        let vector = vector_list(&vec_entries);
        let lexical = lexical_list(&lex_entries);
        let params = FusionParams::default();

        let once = fuse(&vector, &lexical, &params);
        let twice = fuse(&vector, &lexical, &params);

        let ids_once: Vec<_> = once.iter().map(|c| c.id.clone()).collect();
        let ids_twice: Vec<_> = twice.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn fused_candidates_have_provenance(
        vec_entries in arb_ranked_list(12),
        lex_entries in arb_ranked_list(12),
    ) {
        let fused = fuse(
            &vector_list(&vec_entries),
            &lexical_list(&lex_entries),
            &FusionParams::default(),
        );
        for c in &fused {
            prop_assert!(!c.provenance.is_empty());
        }
    }

    #[test]
    fn merge_respects_dedup_cap_and_order(
        results in arb_kb_results(),
        max_results in 1..30usize,
        adaptive in proptest::bool::ANY,
    ) {
        let params = MergeParams {
            strategy: if adaptive { MergeStrategy::Adaptive } else { MergeStrategy::Fixed },
            quota: MergeQuota::default(),
            max_results,
            ..Default::default()
        };

        let merged = merge_sources(&results, &params);

        prop_assert!(merged.len() <= max_results);
        let mut seen = HashSet::new();
        for c in &merged {
            prop_assert!(seen.insert(c.dedup_key()));
        }
        for pair in merged.windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
        }
    }

    #[test]
    fn merge_is_idempotent(results in arb_kb_results()) {
        let params = MergeParams {
            strategy: MergeStrategy::Adaptive,
            ..Default::default()
        };

        let once = merge_sources(&results, &params);
        let twice = merge_sources(&results, &params);

        let keys_once: Vec<_> = once.iter().map(Candidate::dedup_key).collect();
        let keys_twice: Vec<_> = twice.iter().map(Candidate::dedup_key).collect();
        prop_assert_eq!(keys_once, keys_twice);
    }

    #[test]
    fn threshold_partition_is_complete(
        results in arb_kb_results(),
        threshold in 0.0..1.2f64,
    ) {
        let merged = merge_sources(&results, &MergeParams::default());
        let total = merged.len();

        let ranked = apply_threshold(merged, threshold);

        prop_assert_eq!(ranked.len() + ranked.below_threshold, total);
        for c in &ranked.candidates {
            prop_assert!(c.fused_score >= threshold);
        }
    }
}

#[test]
fn golden_rank_one_both_lists() {
    // rrf_k=60, weights 0.7/0.3, rank 1 in both lists: 1/61.
    let vector = vector_list(&[(1, 0.95)]);
    let lexical = lexical_list(&[(1, 0.000001)]);

    let fused = fuse(&vector, &lexical, &FusionParams::default());

    assert_eq!(fused.len(), 1);
    assert!((fused[0].fused_score - 1.0 / 61.0).abs() < 1e-9);
    assert!((fused[0].fused_score - 0.016393).abs() < 1e-6);
}
