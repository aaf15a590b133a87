//! Property tests for layout normalization.

use proptest::prelude::*;

use crate::layout::{
    inverse_layout_permutation, invert_permutation, is_normalized, is_permutation, normalize, permute,
};

/// Arbitrary permutation of `0..n` for n in 1..=5 (the fast path's supported
/// rank range).
fn arb_layout() -> impl Strategy<Value = Vec<usize>> {
    (1usize..=5).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn shuffles_are_permutations(layout in arb_layout()) {
        prop_assert!(is_permutation(&layout));
    }

    #[test]
    fn inverse_composes_to_identity(layout in arb_layout()) {
        let inverse = invert_permutation(&layout);
        let composed = permute(&inverse, &layout);
        let identity: Vec<usize> = (0..layout.len()).collect();
        prop_assert_eq!(composed.to_vec(), identity);
    }

    #[test]
    fn inverse_layout_permutation_undoes_normalization(layout in arb_layout()) {
        let values: Vec<i64> = (0..layout.len() as i64).map(|v| v * 10).collect();
        let normalized = normalize(&values, &layout);
        let restored = permute(&normalized, &inverse_layout_permutation(&layout));
        prop_assert_eq!(restored.to_vec(), values);
    }

    #[test]
    fn normalize_is_idempotent(layout in arb_layout()) {
        let values: Vec<i64> = (0..layout.len() as i64).collect();
        let once = normalize(&values, &layout);
        // A normalized value list carries the normalized layout, on which
        // normalize is the identity.
        let descending: Vec<usize> = (0..layout.len()).rev().collect();
        let twice = normalize(&once, &descending);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn normalized_exactly_for_descending_order(layout in arb_layout()) {
        let descending: Vec<usize> = (0..layout.len()).rev().collect();
        prop_assert_eq!(is_normalized(&layout), layout == descending);
    }

    #[test]
    fn normalized_values_agree_with_physical_order(layout in arb_layout()) {
        // The minor-to-major walk of the normalized list must equal the
        // minor-to-major walk of the original list.
        let values: Vec<i64> = (0..layout.len() as i64).map(|v| v + 100).collect();
        let normalized = normalize(&values, &layout);
        let physical_original: Vec<i64> = layout.iter().map(|&d| values[d]).collect();
        let physical_normalized: Vec<i64> =
            (0..normalized.len()).rev().map(|i| normalized[i]).collect();
        prop_assert_eq!(physical_original, physical_normalized);
    }
}
