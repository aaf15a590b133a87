//! Operation enum and implementation.
//!
//! The [`Op`] enum defines both dialects the lowering pass touches: the tile
//! dialect it consumes (tile/scalar extract and insert) and the pointer and
//! descriptor dialect it emits (add-ptr, make-tensor-ptr, loads and stores,
//! descriptor loads and stores, transpose).
//!
//! Each operation encodes its operand structure directly in the enum
//! variant. Variable-arity operand lists use SmallVec to avoid heap
//! allocation for common ranks.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::indexing::IndexMap;
use crate::layout::Layout;
use crate::sint::SInt;
use crate::types::{BinaryOp, CacheModifier, ConstValue, EvictionPolicy, PaddingMode};
use crate::uop::UOp;

/// Operation with typed operands.
///
/// Note: PartialEq, Eq, and Hash are NOT derived because Op contains
/// Arc<UOp>. Node identity goes through [`crate::UOpKey`] instead.
#[derive(Debug, Clone)]
pub enum Op {
    // Nullary operations
    Const(ConstValue),

    /// Reference to a function argument.
    Arg { index: usize },

    // Index arithmetic
    Binary(BinaryOp, Arc<UOp>, Arc<UOp>),

    /// Unsigned index cast. The operand is known non-negative by
    /// construction, so widening and narrowing are both sound.
    IndexCast { src: Arc<UOp> },

    /// Apply a single-result affine indexing map to index operands.
    ApplyIndexing { map: IndexMap, operands: SmallVec<[Arc<UOp>; 4]> },

    // Domain casts between the tensor world and the pointer world. These
    // stay in the output as explicit conversion points for later dialect
    // conversion to clean up.
    PtrCast { src: Arc<UOp> },
    DescCast { src: Arc<UOp> },

    /// Cast a retyped (pointer- or descriptor-typed) argument back to its
    /// tensor view. Inserted by the signature rewrite so body operations
    /// keep their tensor-typed operands.
    TensorCast { src: Arc<UOp> },

    // Tile dialect (input to the lowering)
    /// Read a rectangular tile out of a larger tensor. The tile shape is the
    /// operation's result type.
    TileExtract {
        src: Arc<UOp>,
        offsets: SmallVec<[Arc<UOp>; 4]>,
        strides: SmallVec<[SInt; 4]>,
        layout: Layout,
    },

    /// Write a rectangular tile into a larger tensor. Yields the destination
    /// tensor for downstream SSA use.
    TileInsert {
        tile: Arc<UOp>,
        dst: Arc<UOp>,
        offsets: SmallVec<[Arc<UOp>; 4]>,
        strides: SmallVec<[SInt; 4]>,
        layout: Layout,
    },

    /// Read the single element of a rank-0 tensor.
    ScalarExtract { src: Arc<UOp> },

    /// Write the single element of a rank-0 tensor. Yields the destination.
    ScalarInsert { dst: Arc<UOp>, scalar: Arc<UOp> },

    // Lowered pointer/descriptor dialect
    /// Advance a raw pointer by an element offset.
    AddPtr { ptr: Arc<UOp>, offset: Arc<UOp> },

    /// Build a tile pointer from a pre-advanced base pointer. `extents` are
    /// the residual per-dimension sizes, `offsets` are always zero, and
    /// `strides` are physical. `order` is carried but ignored downstream
    /// (the strides already encode the layout).
    MakeTensorPtr {
        ptr: Arc<UOp>,
        extents: SmallVec<[Arc<UOp>; 4]>,
        strides: SmallVec<[Arc<UOp>; 4]>,
        offsets: SmallVec<[Arc<UOp>; 4]>,
        tile_shape: SmallVec<[i64; 4]>,
        order: SmallVec<[usize; 4]>,
    },

    /// Load through a raw or tile pointer, masking the listed dimensions.
    Load {
        ptr: Arc<UOp>,
        boundary_checks: SmallVec<[usize; 4]>,
        padding: Option<PaddingMode>,
        cache: CacheModifier,
        eviction: EvictionPolicy,
        volatile: bool,
    },

    /// Store through a raw or tile pointer, masking the listed dimensions.
    /// Typed as the destination tensor, which it forwards in SSA.
    Store {
        ptr: Arc<UOp>,
        value: Arc<UOp>,
        boundary_checks: SmallVec<[usize; 4]>,
        cache: CacheModifier,
        eviction: EvictionPolicy,
    },

    /// Hardware descriptor load of one tile at the given (normalized,
    /// i32-cast) offsets.
    DescriptorLoad { desc: Arc<UOp>, offsets: SmallVec<[Arc<UOp>; 4]> },

    /// Hardware descriptor store of one tile. Typed as the destination
    /// tensor, which it forwards in SSA.
    DescriptorStore { desc: Arc<UOp>, value: Arc<UOp>, offsets: SmallVec<[Arc<UOp>; 4]> },

    /// Dimension permutation: `result dim i = src dim order[i]`.
    Transpose { src: Arc<UOp>, order: SmallVec<[usize; 4]> },

    // Terminators
    /// Return values from a function.
    Return { values: SmallVec<[Arc<UOp>; 2]> },

    /// Value-less terminator anchoring side-effecting operations. Replaces
    /// `Return` once the signature rewrite drops declared results.
    Sink { sources: SmallVec<[Arc<UOp>; 4]> },
}

/// Operation kind discriminant used for pattern-matcher dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKey {
    Const,
    Arg,
    Binary(BinaryOp),
    IndexCast,
    ApplyIndexing,
    PtrCast,
    DescCast,
    TensorCast,
    TileExtract,
    TileInsert,
    ScalarExtract,
    ScalarInsert,
    AddPtr,
    MakeTensorPtr,
    Load,
    Store,
    DescriptorLoad,
    DescriptorStore,
    Transpose,
    Return,
    Sink,
}

impl OpKey {
    pub fn from_op(op: &Op) -> Self {
        match op {
            Op::Const(_) => OpKey::Const,
            Op::Arg { .. } => OpKey::Arg,
            Op::Binary(b, ..) => OpKey::Binary(*b),
            Op::IndexCast { .. } => OpKey::IndexCast,
            Op::ApplyIndexing { .. } => OpKey::ApplyIndexing,
            Op::PtrCast { .. } => OpKey::PtrCast,
            Op::DescCast { .. } => OpKey::DescCast,
            Op::TensorCast { .. } => OpKey::TensorCast,
            Op::TileExtract { .. } => OpKey::TileExtract,
            Op::TileInsert { .. } => OpKey::TileInsert,
            Op::ScalarExtract { .. } => OpKey::ScalarExtract,
            Op::ScalarInsert { .. } => OpKey::ScalarInsert,
            Op::AddPtr { .. } => OpKey::AddPtr,
            Op::MakeTensorPtr { .. } => OpKey::MakeTensorPtr,
            Op::Load { .. } => OpKey::Load,
            Op::Store { .. } => OpKey::Store,
            Op::DescriptorLoad { .. } => OpKey::DescriptorLoad,
            Op::DescriptorStore { .. } => OpKey::DescriptorStore,
            Op::Transpose { .. } => OpKey::Transpose,
            Op::Return { .. } => OpKey::Return,
            Op::Sink { .. } => OpKey::Sink,
        }
    }

    /// Whether this kind is a tile-dialect access awaiting lowering.
    pub const fn is_tile_access(&self) -> bool {
        matches!(
            self,
            OpKey::TileExtract | OpKey::TileInsert | OpKey::ScalarExtract | OpKey::ScalarInsert
        )
    }
}

impl Op {
    /// Operand UOps in canonical order (the order `with_sources` consumes).
    ///
    /// Symbolic tile strides are attribute-like and intentionally not
    /// traversed: the access rules consume them directly.
    pub fn sources(&self) -> SmallVec<[Arc<UOp>; 4]> {
        let mut out: SmallVec<[Arc<UOp>; 4]> = SmallVec::new();
        match self {
            Op::Const(_) | Op::Arg { .. } => {}
            Op::Binary(_, a, b) => {
                out.push(a.clone());
                out.push(b.clone());
            }
            Op::IndexCast { src }
            | Op::PtrCast { src }
            | Op::DescCast { src }
            | Op::TensorCast { src }
            | Op::Transpose { src, .. } => {
                out.push(src.clone());
            }
            Op::ApplyIndexing { operands, .. } => out.extend(operands.iter().cloned()),
            Op::TileExtract { src, offsets, .. } => {
                out.push(src.clone());
                out.extend(offsets.iter().cloned());
            }
            Op::TileInsert { tile, dst, offsets, .. } => {
                out.push(tile.clone());
                out.push(dst.clone());
                out.extend(offsets.iter().cloned());
            }
            Op::ScalarExtract { src } => out.push(src.clone()),
            Op::ScalarInsert { dst, scalar } => {
                out.push(dst.clone());
                out.push(scalar.clone());
            }
            Op::AddPtr { ptr, offset } => {
                out.push(ptr.clone());
                out.push(offset.clone());
            }
            Op::MakeTensorPtr { ptr, extents, strides, offsets, .. } => {
                out.push(ptr.clone());
                out.extend(extents.iter().cloned());
                out.extend(strides.iter().cloned());
                out.extend(offsets.iter().cloned());
            }
            Op::Load { ptr, .. } => out.push(ptr.clone()),
            Op::Store { ptr, value, .. } => {
                out.push(ptr.clone());
                out.push(value.clone());
            }
            Op::DescriptorLoad { desc, offsets } => {
                out.push(desc.clone());
                out.extend(offsets.iter().cloned());
            }
            Op::DescriptorStore { desc, value, offsets } => {
                out.push(desc.clone());
                out.push(value.clone());
                out.extend(offsets.iter().cloned());
            }
            Op::Return { values } => out.extend(values.iter().cloned()),
            Op::Sink { sources } => out.extend(sources.iter().cloned()),
        }
        out
    }

    /// Rebuild this operation with replacement operands, in the order
    /// [`Op::sources`] produced them.
    pub fn with_sources(&self, new_srcs: &[Arc<UOp>]) -> Op {
        let src = |n: usize| new_srcs[n].clone();
        let range = |start: usize, len: usize| new_srcs[start..start + len].to_vec();
        debug_assert_eq!(new_srcs.len(), self.sources().len(), "operand count mismatch in with_sources");

        match self {
            Op::Const(_) | Op::Arg { .. } => self.clone(),
            Op::Binary(b, ..) => Op::Binary(*b, src(0), src(1)),
            Op::IndexCast { .. } => Op::IndexCast { src: src(0) },
            Op::PtrCast { .. } => Op::PtrCast { src: src(0) },
            Op::DescCast { .. } => Op::DescCast { src: src(0) },
            Op::TensorCast { .. } => Op::TensorCast { src: src(0) },
            Op::Transpose { order, .. } => Op::Transpose { src: src(0), order: order.clone() },
            Op::ApplyIndexing { map, operands } => {
                Op::ApplyIndexing { map: map.clone(), operands: range(0, operands.len()).into() }
            }
            Op::TileExtract { offsets, strides, layout, .. } => Op::TileExtract {
                src: src(0),
                offsets: range(1, offsets.len()).into(),
                strides: strides.clone(),
                layout: layout.clone(),
            },
            Op::TileInsert { offsets, strides, layout, .. } => Op::TileInsert {
                tile: src(0),
                dst: src(1),
                offsets: range(2, offsets.len()).into(),
                strides: strides.clone(),
                layout: layout.clone(),
            },
            Op::ScalarExtract { .. } => Op::ScalarExtract { src: src(0) },
            Op::ScalarInsert { .. } => Op::ScalarInsert { dst: src(0), scalar: src(1) },
            Op::AddPtr { .. } => Op::AddPtr { ptr: src(0), offset: src(1) },
            Op::MakeTensorPtr { extents, strides, offsets, tile_shape, order, .. } => Op::MakeTensorPtr {
                ptr: src(0),
                extents: range(1, extents.len()).into(),
                strides: range(1 + extents.len(), strides.len()).into(),
                offsets: range(1 + extents.len() + strides.len(), offsets.len()).into(),
                tile_shape: tile_shape.clone(),
                order: order.clone(),
            },
            Op::Load { boundary_checks, padding, cache, eviction, volatile, .. } => Op::Load {
                ptr: src(0),
                boundary_checks: boundary_checks.clone(),
                padding: *padding,
                cache: *cache,
                eviction: *eviction,
                volatile: *volatile,
            },
            Op::Store { boundary_checks, cache, eviction, .. } => Op::Store {
                ptr: src(0),
                value: src(1),
                boundary_checks: boundary_checks.clone(),
                cache: *cache,
                eviction: *eviction,
            },
            Op::DescriptorLoad { offsets, .. } => {
                Op::DescriptorLoad { desc: src(0), offsets: range(1, offsets.len()).into() }
            }
            Op::DescriptorStore { offsets, .. } => {
                Op::DescriptorStore { desc: src(0), value: src(1), offsets: range(2, offsets.len()).into() }
            }
            Op::Return { values } => Op::Return { values: range(0, values.len()).into() },
            Op::Sink { sources } => Op::Sink { sources: range(0, sources.len()).into() },
        }
    }
}
