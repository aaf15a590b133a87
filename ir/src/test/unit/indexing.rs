//! Affine expression and indexing map tests.

use test_case::test_case;

use crate::Error;
use crate::indexing::{AffineExpr, IndexMap, linearize_map};

#[test]
fn linearize_row_major() {
    // Shape [4, 8], minor dimension is logical dim 1: strides [8, 1].
    let map = linearize_map(&[4, 8], &[1, 0]);
    assert_eq!(map.evaluate(&[0, 0]).unwrap().as_slice(), &[0]);
    assert_eq!(map.evaluate(&[2, 3]).unwrap().as_slice(), &[19]);
    assert_eq!(map.evaluate(&[3, 7]).unwrap().as_slice(), &[31]);
}

#[test]
fn linearize_column_major() {
    // Shape [4, 8], minor dimension is logical dim 0: strides [1, 4].
    let map = linearize_map(&[4, 8], &[0, 1]);
    assert_eq!(map.evaluate(&[2, 3]).unwrap().as_slice(), &[14]);
}

#[test]
fn linearize_rank_zero() {
    let map = linearize_map(&[], &[]);
    assert_eq!(map.single_result(), Some(&AffineExpr::Const(0)));
    assert_eq!(map.evaluate(&[]).unwrap().as_slice(), &[0]);
}

#[test]
fn evaluate_checks_arity() {
    let map = linearize_map(&[4, 8], &[1, 0]);
    let result = map.evaluate(&[1]);
    assert!(matches!(result, Err(Error::IndexMapArity { expected: 2, actual: 1 })));
}

#[test]
fn single_result_rejects_multi() {
    let map = IndexMap::new(1, [AffineExpr::dim(0), AffineExpr::cst(1)]);
    assert!(map.single_result().is_none());
}

#[test_case(AffineExpr::cst(32), 16, true; "constant multiple")]
#[test_case(AffineExpr::cst(24), 16, false; "constant non-multiple")]
#[test_case(AffineExpr::dim(0), 16, false; "bare dimension")]
#[test_case(AffineExpr::dim(0), 1, true; "factor one")]
#[test_case(AffineExpr::dim(0).mul(AffineExpr::cst(16)), 16, true; "scaled dimension")]
#[test_case(AffineExpr::dim(0).mul(AffineExpr::cst(64)), 16, true; "larger scale")]
#[test_case(AffineExpr::dim(0).mul(AffineExpr::cst(8)), 16, false; "insufficient scale")]
fn divisibility(expr: AffineExpr, factor: i64, expected: bool) {
    assert_eq!(expr.is_multiple_of(factor), expected);
}

#[test]
fn divisibility_of_sums() {
    let scaled = AffineExpr::dim(0).mul(AffineExpr::cst(16));
    assert!(scaled.clone().add(AffineExpr::cst(32)).is_multiple_of(16));
    assert!(!scaled.clone().add(AffineExpr::cst(8)).is_multiple_of(16));
    assert!(scaled.add(AffineExpr::cst(8)).is_multiple_of(8));
}

#[test]
fn constructors_fold_constants() {
    assert_eq!(AffineExpr::cst(2).add(AffineExpr::cst(3)), AffineExpr::Const(5));
    assert_eq!(AffineExpr::cst(2).mul(AffineExpr::cst(3)), AffineExpr::Const(6));
    assert_eq!(AffineExpr::dim(1).mul(AffineExpr::cst(0)), AffineExpr::Const(0));
    assert_eq!(AffineExpr::dim(1).mul(AffineExpr::cst(1)), AffineExpr::Dim(1));
    assert_eq!(AffineExpr::cst(0).add(AffineExpr::dim(2)), AffineExpr::Dim(2));
}

#[test]
fn linearized_map_divisibility_reflects_strides() {
    // Offsets scaled by a 128-wide minor dimension: the map's result is a
    // multiple of 128 whenever the minor offset is zero... but the minor
    // offset term has stride 1, so the full map only guarantees factor 1.
    let map = linearize_map(&[1024, 1024], &[1, 0]);
    let expr = map.single_result().unwrap();
    assert!(!expr.is_multiple_of(16));

    // A map built from a tile-index input times the tile width does prove
    // divisibility, which is what the legality oracle relies on.
    let tile_indexed = IndexMap::new(1, [AffineExpr::dim(0).mul(AffineExpr::cst(128))]);
    assert!(tile_indexed.single_result().unwrap().is_multiple_of(16));
}
