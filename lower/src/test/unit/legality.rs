//! Legality oracle tests.

use std::sync::Arc;

use smallvec::smallvec;
use test_case::test_case;

use tessel_device::DeviceDescription;
use tessel_dtype::ScalarDType;
use tessel_ir::indexing::{AffineExpr, IndexMap};
use tessel_ir::{BinaryOp, Function, Op, SInt, UOp};

use crate::context::LoweringContext;
use crate::legality::{can_use_tma, offset_divisibility_guaranteed};
use crate::test::helpers::*;

/// Run the oracle against the single tile-extract inside `func`.
fn oracle(device: &DeviceDescription, tma_enabled: bool, func: &Function) -> bool {
    let ctx = LoweringContext::new(device, tma_enabled, func);
    let Op::Return { values } = func.body.op() else {
        panic!("test function must end in a return");
    };
    let extract = &values[0];
    let Op::TileExtract { src, offsets, strides, layout } = extract.op() else {
        panic!("test function must wrap a tile extract");
    };
    can_use_tma(&ctx, extract.dims().unwrap(), strides, offsets, src, layout)
}

fn baseline() -> Function {
    extract_function_f32(&[1024, 1024], &[128, 128], &[0, 0], smallvec![1, 0])
}

#[test]
fn baseline_is_eligible() {
    assert!(oracle(&hopper(), true, &baseline()));
}

#[test]
fn requires_the_feature_flag() {
    assert!(!oracle(&hopper(), false, &baseline()));
}

#[test]
fn requires_device_support() {
    assert!(!oracle(&pre_hopper(), true, &baseline()));
    assert!(!oracle(&DeviceDescription::default(), true, &baseline()));
}

#[test_case(&[128, 3], false; "twelve byte rows")]
#[test_case(&[128, 4], true; "sixteen byte rows")]
#[test_case(&[128, 8], true; "thirty two byte rows")]
fn minor_dimension_byte_divisibility(tile: &[i64], expected: bool) {
    // f32: the minor tile dimension must contribute a multiple of 16 bytes.
    let func = extract_function_f32(&[1024, 1024], tile, &[0, 0], smallvec![1, 0]);
    assert_eq!(oracle(&hopper(), true, &func), expected);
}

#[test]
fn rejects_oversized_tiles() {
    let func = extract_function_f32(&[1024, 1024], &[512, 128], &[0, 0], smallvec![1, 0]);
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_rank_above_five() {
    let original = [2i64, 2, 2, 2, 2, 16];
    let tile = [1i64, 1, 1, 1, 1, 16];
    let layout = smallvec![5, 4, 3, 2, 1, 0];
    let func = extract_function_f32(&original, &tile, &[0; 6], layout);
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_multi_use_arguments() {
    // Two extracts of the same argument: reprogramming its type would be
    // unsound.
    let src_type = tessel_dtype::DType::tensor(ScalarDType::Float32, vec![1024, 1024]);
    let src = UOp::arg(0, src_type.clone());
    let make_extract = |offset: i64| {
        UOp::tile_extract(
            src.clone(),
            vec![128, 128],
            index_offsets(&[offset, 0]),
            unit_strides(2),
            smallvec![1, 0],
        )
        .unwrap()
    };
    let first = make_extract(0);
    let second = make_extract(128);
    let tile_type = first.dtype();
    let func = Function::new(
        "double_extract",
        vec![src_type],
        vec![tile_type.clone(), tile_type],
        UOp::return_(vec![first, second]),
    );
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_non_argument_tensors() {
    // The source is a transpose result, not a function argument.
    let src_type = tessel_dtype::DType::tensor(ScalarDType::Float32, vec![1024, 1024]);
    let arg = UOp::arg(0, src_type.clone());
    let transposed = UOp::transpose(arg, smallvec![1, 0]).unwrap();
    let extract = UOp::tile_extract(
        transposed,
        vec![128, 128],
        index_offsets(&[0, 0]),
        unit_strides(2),
        smallvec![1, 0],
    )
    .unwrap();
    let tile_type = extract.dtype();
    let func = Function::new("indirect", vec![src_type], vec![tile_type], UOp::return_(vec![extract]));
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_symbolic_strides() {
    let symbolic = UOp::binary(BinaryOp::Add, UOp::index_const(1), UOp::index_const(0));
    let func = extract_function(
        &[1024, 1024],
        &[128, 128],
        &[0, 0],
        smallvec![1, 0],
        vec![SInt::from(1), SInt::Symbolic(symbolic)],
        ScalarDType::Float32,
    );
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_non_contiguous_minor_stride() {
    // Minor dimension is logical dim 1; its tile stride must be exactly 1.
    let func = extract_function(
        &[1024, 1024],
        &[128, 128],
        &[0, 0],
        smallvec![1, 0],
        vec![SInt::from(1), SInt::from(2)],
        ScalarDType::Float32,
    );
    assert!(!oracle(&hopper(), true, &func));

    // A non-unit stride in the major dimension is fine.
    let func = extract_function(
        &[1024, 1024],
        &[128, 128],
        &[0, 0],
        smallvec![1, 0],
        vec![SInt::from(2), SInt::from(1)],
        ScalarDType::Float32,
    );
    assert!(oracle(&hopper(), true, &func));
}

#[test]
fn rejects_oversized_global_dimensions() {
    let func = extract_function_f32(&[1 << 33, 16], &[1, 16], &[0, 0], smallvec![1, 0]);
    assert!(!oracle(&hopper(), true, &func));
}

#[test]
fn rejects_oversized_global_strides() {
    // Outer physical byte stride is 2^44, past the 40-bit limit.
    let func = extract_function_f32(&[1 << 20, 1 << 22], &[1, 128], &[0, 0], smallvec![1, 0]);
    assert!(!oracle(&hopper(), true, &func));
}

#[test_case(8, true; "aligned constant")]
#[test_case(4, true; "exactly one line")]
#[test_case(2, false; "half a line")]
#[test_case(3, false; "odd offset")]
fn constant_minor_offsets(offset: i64, expected: bool) {
    // f32: offsets must be multiples of 16/gcd(16,4) = 4 elements.
    let func = extract_function_f32(&[1024, 1024], &[128, 128], &[0, offset], smallvec![1, 0]);
    assert_eq!(oracle(&hopper(), true, &func), expected);
}

#[test]
fn affine_offsets_prove_divisibility() {
    let tile_indexed = |expr: AffineExpr| -> Arc<UOp> {
        UOp::apply_indexing(IndexMap::new(1, [expr]), vec![UOp::index_const(0)]).unwrap()
    };

    // offset = tile_index * 128: always a multiple of 4 elements.
    let proven = tile_indexed(AffineExpr::dim(0).mul(AffineExpr::cst(128)));
    assert!(offset_divisibility_guaranteed(&proven, 4));

    // offset = tile_index: nothing provable.
    let unproven = tile_indexed(AffineExpr::dim(0));
    assert!(!offset_divisibility_guaranteed(&unproven, 4));
}

#[test]
fn other_offset_producers_are_conservatively_rejected() {
    let computed = UOp::binary(BinaryOp::Add, UOp::index_const(64), UOp::index_const(64));
    assert!(!offset_divisibility_guaranteed(&computed, 4));
}

#[test]
fn divisor_scales_with_element_width() {
    // 8-byte elements only need 2-element alignment; 1-byte need 16.
    assert!(offset_divisibility_guaranteed(&UOp::index_const(2), 8));
    assert!(!offset_divisibility_guaranteed(&UOp::index_const(1), 8));
    assert!(offset_divisibility_guaranteed(&UOp::index_const(16), 1));
    assert!(!offset_divisibility_guaranteed(&UOp::index_const(8), 1));
}
