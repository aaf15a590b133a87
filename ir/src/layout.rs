//! Minor-to-major layout handling.
//!
//! A layout is a permutation of `0..rank` stating the physical storage order
//! of a tensor's logical dimensions, minor (fastest-varying) dimension first.
//! The normalized layout is `[rank-1, rank-2, ..., 0]`: physical order equal
//! to the declared dimension order. The descriptor fast path only understands
//! normalized tensors, so non-normalized accesses are permuted going in and
//! transposed back coming out.

use smallvec::SmallVec;

/// Minor-to-major dimension permutation. `layout[0]` is the physical minor
/// dimension's logical index.
pub type Layout = SmallVec<[usize; 4]>;

/// Whether `perm` is a permutation of `0..perm.len()`.
pub fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Gather-permute: `result[i] = values[perm[i]]`.
pub fn permute<T: Clone>(values: &[T], perm: &[usize]) -> SmallVec<[T; 4]> {
    debug_assert_eq!(values.len(), perm.len());
    perm.iter().map(|&p| values[p].clone()).collect()
}

/// Inverse of a permutation: `result[perm[i]] = i`.
pub fn invert_permutation(perm: &[usize]) -> SmallVec<[usize; 4]> {
    let mut inverse: SmallVec<[usize; 4]> = SmallVec::from_elem(0, perm.len());
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

/// Whether `layout` is the normalized layout `[rank-1, ..., 1, 0]`.
pub fn is_normalized(layout: &[usize]) -> bool {
    layout.iter().enumerate().all(|(idx, &entry)| entry == layout.len() - 1 - idx)
}

/// Permute per-dimension values into normalized (minor-to-major descending)
/// order. Identity when the layout is already normalized.
///
/// Generic over the value class: applies identically to static dimension
/// lists and to runtime offset values.
pub fn normalize<T: Clone>(values: &[T], layout: &[usize]) -> SmallVec<[T; 4]> {
    if is_normalized(layout) {
        return values.iter().cloned().collect();
    }
    let mut reversed: SmallVec<[usize; 4]> = layout.iter().copied().collect();
    reversed.reverse();
    permute(values, &reversed)
}

/// The permutation that transposes an already-normalized tensor back to the
/// original dimension order: the reversed layout, inverted.
pub fn inverse_layout_permutation(layout: &[usize]) -> SmallVec<[usize; 4]> {
    let mut reversed: SmallVec<[usize; 4]> = layout.iter().copied().collect();
    reversed.reverse();
    invert_permutation(&reversed)
}
