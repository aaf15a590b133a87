//! The fast-path legality oracle.
//!
//! A pure boolean gate, queried independently per access site so extract and
//! insert sites over different arguments can diverge. Every check mirrors a
//! hardware restriction of the bulk asynchronous copy engine.

use std::sync::Arc;

use tessel_ir::{Op, SInt, UOp};

use crate::context::LoweringContext;

/// The engine addresses 1 to 5 dimensions.
const MAX_RANK: usize = 5;
/// Global dimensions must be in (0, 2^32].
const MAX_GLOBAL_DIM: u64 = 1 << 32;
/// Global byte strides must fit in 40 bits.
const MAX_GLOBAL_STRIDE: u64 = (1 << 40) - 1;
/// Strides, the minor tile row, and the access address must be multiples of
/// 16 bytes. With strides and the minor row already constrained, checking
/// the minor-dimension offset covers the address.
const BYTE_DIVISIBILITY: u64 = 16;
/// Tile dimensions must be in (0, 256].
const MAX_TILE_DIM: i64 = 256;

/// Whether a tile access may take the descriptor fast path.
pub fn can_use_tma(
    ctx: &LoweringContext<'_>,
    tile_shape: &[i64],
    tile_strides: &[SInt],
    offsets: &[Arc<UOp>],
    tensor: &Arc<UOp>,
    layout: &[usize],
) -> bool {
    if !ctx.tma_enabled() {
        return false;
    }
    if !ctx.device().supports_tma() {
        return false;
    }

    if tile_shape.is_empty() || tile_shape.len() > MAX_RANK {
        return false;
    }

    // The fast path reprograms the argument's type, so only a function
    // argument with exactly one use is sound.
    let Op::Arg { index } = tensor.op() else {
        return false;
    };
    if ctx.arg_use_count(*index) != 1 {
        return false;
    }

    let Some(global_shape) = tensor.dims() else {
        return false;
    };
    let Some(elem) = tensor.dtype().elem() else {
        return false;
    };
    let element_byte_size = elem.bytes();
    let minor_dim = layout[0];

    if global_shape.iter().any(|&dim| dim <= 0 || dim as u64 > MAX_GLOBAL_DIM) {
        return false;
    }

    // The minor tile row must be a whole number of 16-byte lines.
    if tile_shape[minor_dim] <= 0
        || (tile_shape[minor_dim] as u64 * element_byte_size) % BYTE_DIVISIBILITY != 0
    {
        return false;
    }
    if tile_shape.iter().any(|&dim| dim <= 0 || dim > MAX_TILE_DIM) {
        return false;
    }

    // The minor dimension must be contiguous, and no stride may be symbolic.
    let Some(static_strides) = tile_strides.iter().map(SInt::as_const).collect::<Option<Vec<i64>>>()
    else {
        return false;
    };
    if static_strides[minor_dim] != 1 {
        return false;
    }

    // Physical byte strides: cumulative product of global dimensions, minor
    // to major. The minor stride must be 16-byte aligned; outer strides are
    // multiples of it and only need the magnitude check.
    if global_shape.len() >= 2 {
        let mut stride = global_shape[minor_dim] as u64 * element_byte_size;
        if stride % BYTE_DIVISIBILITY != 0 || stride > MAX_GLOBAL_STRIDE {
            return false;
        }
        for i in 1..global_shape.len() {
            stride *= global_shape[layout[i]] as u64;
            if stride > MAX_GLOBAL_STRIDE {
                return false;
            }
        }
    }

    offset_divisibility_guaranteed(&offsets[minor_dim], element_byte_size)
}

/// Whether `offset` is provably a multiple of `16 / gcd(16, elem_bytes)`
/// elements:
/// - a compile-time constant with the right remainder, or
/// - the single result of an affine indexing computation whose expression is
///   a multiple of that divisor.
///
/// Any other producer is not provable; assume not.
pub fn offset_divisibility_guaranteed(offset: &Arc<UOp>, element_byte_size: u64) -> bool {
    let divisor = (BYTE_DIVISIBILITY / gcd(BYTE_DIVISIBILITY, element_byte_size)) as i64;
    match offset.op() {
        Op::Const(value) => value.as_i64() % divisor == 0,
        Op::ApplyIndexing { map, .. } => {
            map.single_result().is_some_and(|expr| expr.is_multiple_of(divisor))
        }
        _ => false,
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
