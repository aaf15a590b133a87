//! Access-site rewrite rules.
//!
//! One-shot rules over the four tile-dialect access kinds. Each rule either
//! fully builds its replacement and swaps it in, or makes no change at all:
//! a failed build (input contract violation) logs the reason and declines,
//! leaving the access in place to surface as a pass failure later.

use std::sync::Arc;

use smallvec::SmallVec;

use tessel_dtype::DType;
use tessel_ir::layout;
use tessel_ir::{Op, OpKey, PaddingMode, PatternMatcher, RewriteResult, SInt, TmaDescriptor, UOp};

use crate::address;
use crate::context::LoweringContext;
use crate::error::Result;
use crate::legality;

/// The access-site rules, indexed by op kind.
pub fn access_patterns<'d>() -> PatternMatcher<LoweringContext<'d>> {
    let mut matcher = PatternMatcher::new();
    matcher.add(&[OpKey::TileExtract], |uop, ctx: &mut LoweringContext<'_>| {
        to_rewrite(lower_extract(uop, ctx))
    });
    matcher.add(&[OpKey::TileInsert], |uop, ctx: &mut LoweringContext<'_>| {
        to_rewrite(lower_insert(uop, ctx))
    });
    matcher.add(&[OpKey::ScalarExtract], |uop, _ctx| to_rewrite(lower_scalar_extract(uop)));
    matcher.add(&[OpKey::ScalarInsert], |uop, _ctx| to_rewrite(lower_scalar_insert(uop)));
    matcher
}

fn to_rewrite(result: Result<Option<Arc<UOp>>>) -> RewriteResult {
    match result {
        Ok(Some(replacement)) => RewriteResult::Rewritten(replacement),
        Ok(None) => RewriteResult::NoMatch,
        Err(error) => {
            tracing::warn!(%error, "access lowering declined");
            RewriteResult::NoMatch
        }
    }
}

fn cast_offsets_i32(offsets: &[Arc<UOp>]) -> Vec<Arc<UOp>> {
    offsets.iter().map(|offset| UOp::index_cast(offset.clone(), DType::INT32)).collect()
}

/// Canonicalize the (static, oracle-approved) tile strides and record the
/// descriptor metadata on the accessed argument.
fn mark_fast_path_argument(
    ctx: &mut LoweringContext<'_>,
    tensor: &Arc<UOp>,
    original_shape: &[i64],
    tile_shape: &[i64],
    tile_strides: &[SInt],
    layout: &layout::Layout,
) -> Result<Option<()>> {
    let Op::Arg { index } = tensor.op() else {
        return Ok(None);
    };
    let Some(elem) = tensor.dtype().elem() else {
        return Ok(None);
    };

    let mut canonical: SmallVec<[i64; 4]> = tile_strides.iter().filter_map(SInt::as_const).collect();
    address::canonicalize_tile_strides(&mut canonical, tile_shape, original_shape)?;

    ctx.record_tma_attributes(
        *index,
        TmaDescriptor {
            global_shape: original_shape.iter().copied().collect(),
            tile_shape: tile_shape.iter().copied().collect(),
            tile_strides: canonical,
            layout: layout.clone(),
            element_byte_size: elem.bytes(),
        },
    );
    Ok(Some(()))
}

/// Tile read.
///
/// Without the fast path: add-ptr + make-tensor-ptr + load, offsets resolved
/// in the pointer advance. With it: a descriptor load at normalized offsets,
/// plus a transpose back to the declared dimension order when the layout is
/// not normalized (so both lowerings yield the same tile).
fn lower_extract(uop: &Arc<UOp>, ctx: &mut LoweringContext<'_>) -> Result<Option<Arc<UOp>>> {
    let Op::TileExtract { src, offsets, strides, layout } = uop.op() else {
        return Ok(None);
    };
    let (Some(tile_shape), Some(original_shape), Some(elem)) =
        (uop.dims(), src.dims(), src.dtype().elem())
    else {
        return Ok(None);
    };

    if legality::can_use_tma(ctx, tile_shape, strides, offsets, src, layout) {
        if mark_fast_path_argument(ctx, src, original_shape, tile_shape, strides, layout)?.is_none() {
            return Ok(None);
        }

        let normalized_tile_shape = layout::normalize(tile_shape, layout);
        let normalized_offsets = layout::normalize(offsets, layout);

        let desc = UOp::desc_cast(
            src.clone(),
            DType::TensorDesc { elem, tile_dims: normalized_tile_shape.to_vec() },
        )?;
        let load = UOp::descriptor_load(desc, cast_offsets_i32(&normalized_offsets))?;

        if !layout::is_normalized(layout) {
            // Transpose the normalized result back to the original order.
            let transpose = UOp::transpose(load, layout::inverse_layout_permutation(layout))?;
            return Ok(Some(transpose));
        }
        return Ok(Some(load));
    }

    let ptr = address::advanced_base_ptr(src, original_shape, offsets, layout)?;
    let ptr = address::tile_ptr(ptr, original_shape, tile_shape, offsets, strides, layout)?;
    let checks = address::boundary_checks(original_shape, tile_shape);
    let padding = (!checks.is_empty()).then_some(PaddingMode::Zero);
    Ok(Some(UOp::load(ptr, checks, padding)?))
}

/// Tile write, symmetric to [`lower_extract`]. The fast path transposes the
/// stored tile into normalized form first; both paths forward the
/// destination tensor as the access's result.
fn lower_insert(uop: &Arc<UOp>, ctx: &mut LoweringContext<'_>) -> Result<Option<Arc<UOp>>> {
    let Op::TileInsert { tile, dst, offsets, strides, layout } = uop.op() else {
        return Ok(None);
    };
    let (Some(tile_shape), Some(original_shape), Some(elem)) =
        (tile.dims(), dst.dims(), dst.dtype().elem())
    else {
        return Ok(None);
    };

    if legality::can_use_tma(ctx, tile_shape, strides, offsets, dst, layout) {
        if mark_fast_path_argument(ctx, dst, original_shape, tile_shape, strides, layout)?.is_none() {
            return Ok(None);
        }

        let normalized_tile_shape = layout::normalize(tile_shape, layout);
        let normalized_offsets = layout::normalize(offsets, layout);

        let desc = UOp::desc_cast(
            dst.clone(),
            DType::TensorDesc { elem, tile_dims: normalized_tile_shape.to_vec() },
        )?;

        let mut value = tile.clone();
        if !layout::is_normalized(layout) {
            // Normalizing a tile is simply the reversed layout.
            let mut order: SmallVec<[usize; 4]> = layout.iter().copied().collect();
            order.reverse();
            value = UOp::transpose(value, order)?;
        }

        let store =
            UOp::descriptor_store(desc, value, cast_offsets_i32(&normalized_offsets), dst.dtype())?;
        return Ok(Some(store));
    }

    let ptr = address::advanced_base_ptr(dst, original_shape, offsets, layout)?;
    let ptr = address::tile_ptr(ptr, original_shape, tile_shape, offsets, strides, layout)?;
    let checks = address::boundary_checks(original_shape, tile_shape);
    Ok(Some(UOp::store(ptr, tile.clone(), checks, dst.dtype())?))
}

/// Rank-0 tile read: a plain scalar load through a pointer cast. Any other
/// rank is not this rule's concern.
fn lower_scalar_extract(uop: &Arc<UOp>) -> Result<Option<Arc<UOp>>> {
    let Op::ScalarExtract { src } = uop.op() else {
        return Ok(None);
    };
    if src.dtype().rank() != Some(0) {
        return Ok(None);
    }
    let Some(elem) = src.dtype().elem() else {
        return Ok(None);
    };
    let ptr = UOp::ptr_cast(src.clone(), DType::global_ptr(elem))?;
    Ok(Some(UOp::load(ptr, SmallVec::new(), None)?))
}

/// Rank-0 tile write: a plain scalar store, forwarding the destination.
fn lower_scalar_insert(uop: &Arc<UOp>) -> Result<Option<Arc<UOp>>> {
    let Op::ScalarInsert { dst, scalar } = uop.op() else {
        return Ok(None);
    };
    if dst.dtype().rank() != Some(0) {
        return Ok(None);
    }
    let Some(elem) = dst.dtype().elem() else {
        return Ok(None);
    };
    let ptr = UOp::ptr_cast(dst.clone(), DType::global_ptr(elem))?;
    Ok(Some(UOp::store(ptr, scalar.clone(), SmallVec::new(), dst.dtype())?))
}
