//! Layout normalization and permutation tests.

use smallvec::smallvec;

use crate::layout::{
    inverse_layout_permutation, invert_permutation, is_normalized, is_permutation, normalize, permute,
};

#[test]
fn permutation_validation() {
    assert!(is_permutation(&[]));
    assert!(is_permutation(&[0]));
    assert!(is_permutation(&[1, 0]));
    assert!(is_permutation(&[2, 0, 1]));
    assert!(!is_permutation(&[0, 2]));
    assert!(!is_permutation(&[1, 1]));
}

#[test]
fn permute_is_a_gather() {
    let permuted = permute(&[10, 20, 30], &[2, 0, 1]);
    assert_eq!(permuted.as_slice(), &[30, 10, 20]);
}

#[test]
fn invert_round_trips() {
    let perm = [2, 0, 1];
    let inverse = invert_permutation(&perm);
    assert_eq!(inverse.as_slice(), &[1, 2, 0]);

    let values = [7, 8, 9];
    let there = permute(&values, &perm);
    let back = permute(&there, &inverse);
    assert_eq!(back.as_slice(), &values);
}

#[test]
fn normalized_iff_descending() {
    assert!(is_normalized(&[]));
    assert!(is_normalized(&[0]));
    assert!(is_normalized(&[1, 0]));
    assert!(is_normalized(&[2, 1, 0]));
    assert!(!is_normalized(&[0, 1]));
    assert!(!is_normalized(&[1, 2, 0]));
    assert!(!is_normalized(&[0, 2, 1]));
}

#[test]
fn normalize_is_identity_on_normalized_layouts() {
    let values = [128i64, 64];
    assert_eq!(normalize(&values, &[1, 0]).as_slice(), &values);
}

#[test]
fn normalize_permutes_by_reversed_layout() {
    // Minor dimension is logical dim 0: the normalized form lists the major
    // dimension first.
    assert_eq!(normalize(&[128i64, 64], &[0, 1]).as_slice(), &[64, 128]);

    // 3-d: layout [1, 2, 0] stores dim 1 fastest, then dim 2, then dim 0.
    assert_eq!(normalize(&['a', 'b', 'c'], &[1, 2, 0]).as_slice(), &['a', 'c', 'b']);
}

#[test]
fn inverse_layout_permutation_known_cases() {
    assert_eq!(inverse_layout_permutation(&[1, 0]).as_slice(), &[0, 1]);
    assert_eq!(inverse_layout_permutation(&[0, 1]).as_slice(), &[1, 0]);
    assert_eq!(inverse_layout_permutation(&[2, 0, 1]).as_slice(), &[1, 0, 2]);
}

#[test]
fn inverse_layout_permutation_undoes_normalize() {
    let layout: crate::Layout = smallvec![1, 2, 0];
    let values = [10i64, 20, 30];
    let normalized = normalize(&values, &layout);
    let restored = permute(&normalized, &inverse_layout_permutation(&layout));
    assert_eq!(restored.as_slice(), &values);
}
