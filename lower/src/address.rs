//! Address arithmetic for the generic (tensor-pointer) path.
//!
//! The tensor-pointer primitive always multiplies offsets by strides, which
//! cannot express every offset/stride combination (an offset misaligned with
//! its stride has no encoding). The generic path therefore advances the raw
//! base pointer by a precomputed linear offset and builds the tile pointer
//! with all-zero offsets. Boundary masking then has to work against the
//! *residual* extent (original extent minus the already-applied offset), not
//! the original one.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;

use tessel_dtype::DType;
use tessel_ir::indexing::linearize_map;
use tessel_ir::{BinaryOp, SInt, UOp};

use crate::error::{Result, TileStrideContractSnafu};

/// Canonicalize tile strides in place: a stride of 0 becomes 1 when the tile
/// shape or the original shape is 1 at that index (a size-1 dimension's
/// stride is immaterial). Anything else violates the input contract.
pub fn canonicalize_tile_strides(
    tile_strides: &mut SmallVec<[i64; 4]>,
    tile_shape: &[i64],
    original_shape: &[i64],
) -> Result<()> {
    for i in 0..tile_strides.len() {
        if tile_strides[i] == 0 {
            ensure!(
                tile_shape[i] == 1 || original_shape[i] == 1,
                TileStrideContractSnafu { index: i, tile_dim: tile_shape[i], global_dim: original_shape[i] }
            );
            tile_strides[i] = 1;
        }
    }
    Ok(())
}

/// Dimensions needing a runtime boundary mask: those the tile does not
/// evenly divide, leaving partial tiles at the edge.
pub fn boundary_checks(original_shape: &[i64], tile_shape: &[i64]) -> SmallVec<[usize; 4]> {
    original_shape
        .iter()
        .zip(tile_shape)
        .enumerate()
        .filter(|&(_, (&dim, &tile))| dim % tile != 0)
        .map(|(dim_idx, _)| dim_idx)
        .collect()
}

/// The flattened element offset of a layout-permuted access, as an i64
/// value: the dense linearization map applied to the offsets, then cast.
pub fn linear_offset(global_shape: &[i64], offsets: &[Arc<UOp>], layout: &[usize]) -> Result<Arc<UOp>> {
    let map = linearize_map(global_shape, layout);
    let applied = UOp::apply_indexing(map, offsets.to_vec())?;
    Ok(UOp::index_cast(applied, DType::INT64))
}

fn stride_value(stride: &SInt) -> Arc<UOp> {
    match stride {
        SInt::Const(v) => UOp::index_const(*v),
        SInt::Symbolic(value) => value.clone(),
    }
}

/// Physical strides of the tile: walk the dimensions minor to major,
/// scaling each logical tile stride by the accumulated extent of the
/// dimensions inside it.
pub fn physical_strides(
    original_shape: &[i64],
    tile_strides: &[SInt],
    layout: &[usize],
) -> SmallVec<[Arc<UOp>; 4]> {
    // Placeholders are overwritten for every dimension: the layout is a
    // permutation.
    let mut strides: SmallVec<[Arc<UOp>; 4]> =
        original_shape.iter().map(|_| UOp::i64_const(0)).collect();
    let mut current = 1i64;
    for &dim in layout {
        strides[dim] = UOp::binary(
            BinaryOp::Mul,
            UOp::index_cast(stride_value(&tile_strides[dim]), DType::INT64),
            UOp::i64_const(current),
        );
        current *= original_shape[dim];
    }
    strides
}

/// Residual extents: original extent minus the already-applied offset.
/// Offsets are non-negative by construction (a distance into the tensor),
/// so the unsigned index cast is sound.
pub fn residual_shape(original_shape: &[i64], offsets: &[Arc<UOp>]) -> SmallVec<[Arc<UOp>; 4]> {
    original_shape
        .iter()
        .zip(offsets)
        .map(|(&dim, offset)| {
            UOp::binary(
                BinaryOp::Sub,
                UOp::i64_const(dim),
                UOp::index_cast(offset.clone(), DType::INT64),
            )
        })
        .collect()
}

/// Cast a tensor value to its raw global pointer and advance it to the
/// access's first element.
pub fn advanced_base_ptr(
    tensor: &Arc<UOp>,
    global_shape: &[i64],
    offsets: &[Arc<UOp>],
    layout: &[usize],
) -> Result<Arc<UOp>> {
    let Some(elem) = tensor.dtype().elem() else {
        return Err(tessel_ir::error::NotATensorSnafu { actual: tensor.dtype() }.build().into());
    };
    let ptr = UOp::ptr_cast(tensor.clone(), DType::global_ptr(elem))?;
    let offset = linear_offset(global_shape, offsets, layout)?;
    Ok(UOp::add_ptr(ptr, offset)?)
}

/// Assemble the tile pointer: residual extents, all-zero offsets (the base
/// pointer is already advanced), physical strides, and the default
/// descending dimension order (the strides already encode the layout).
pub fn tile_ptr(
    ptr: Arc<UOp>,
    original_shape: &[i64],
    tile_shape: &[i64],
    offsets: &[Arc<UOp>],
    tile_strides: &[SInt],
    layout: &[usize],
) -> Result<Arc<UOp>> {
    let extents = residual_shape(original_shape, offsets);
    let zero_offsets: Vec<Arc<UOp>> = tile_shape.iter().map(|_| UOp::i32_const(0)).collect();
    let strides = physical_strides(original_shape, tile_strides, layout);
    let order: SmallVec<[usize; 4]> = (0..tile_shape.len()).rev().collect();

    Ok(UOp::make_tensor_ptr(
        ptr,
        extents.to_vec(),
        strides.to_vec(),
        zero_offsets,
        tile_shape.to_vec(),
        order,
    )?)
}
