//! UOp constructor methods, grouped by dialect.
//!
//! Constructors validate operand structure up front and return `Result`
//! where an invariant can be violated by the caller; infallible node kinds
//! return `Arc<UOp>` directly.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;

use tessel_dtype::{DType, ScalarDType};

use crate::error::*;
use crate::indexing::IndexMap;
use crate::layout::{self, Layout};
use crate::op::Op;
use crate::sint::SInt;
use crate::types::{BinaryOp, CacheModifier, ConstValue, EvictionPolicy, PaddingMode};
use crate::uop::UOp;

fn ensure_offsets_indexed(offsets: &[Arc<UOp>]) -> Result<()> {
    for offset in offsets {
        let dtype = offset.dtype();
        ensure!(dtype == DType::INDEX, IndexTypeMismatchSnafu { actual: dtype });
    }
    Ok(())
}

fn ensure_rank(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    ensure!(expected == actual, RankMismatchSnafu { what, expected, actual });
    Ok(())
}

fn tensor_parts(value: &Arc<UOp>) -> Result<(ScalarDType, &[i64])> {
    match &value.dtype {
        DType::Tensor { elem, dims } => Ok((*elem, dims.as_slice())),
        other => NotATensorSnafu { actual: other.clone() }.fail(),
    }
}

impl UOp {
    // =========================================================================
    // Constants and arguments
    // =========================================================================

    pub fn index_const(value: i64) -> Arc<Self> {
        Self::new(Op::Const(ConstValue::Index(value)), DType::INDEX)
    }

    pub fn i32_const(value: i32) -> Arc<Self> {
        Self::new(Op::Const(ConstValue::Int32(value)), DType::INT32)
    }

    pub fn i64_const(value: i64) -> Arc<Self> {
        Self::new(Op::Const(ConstValue::Int64(value)), DType::INT64)
    }

    /// Reference to function argument `index` with the argument's type.
    pub fn arg(index: usize, dtype: DType) -> Arc<Self> {
        Self::new(Op::Arg { index }, dtype)
    }

    // =========================================================================
    // Index arithmetic
    // =========================================================================

    /// Binary arithmetic. The result takes the left operand's dtype.
    pub fn binary(op: BinaryOp, lhs: Arc<Self>, rhs: Arc<Self>) -> Arc<Self> {
        let dtype = lhs.dtype();
        Self::new(Op::Binary(op, lhs, rhs), dtype)
    }

    /// Unsigned cast of a non-negative index value to `dtype`.
    pub fn index_cast(src: Arc<Self>, dtype: DType) -> Arc<Self> {
        Self::new(Op::IndexCast { src }, dtype)
    }

    /// Apply a single-result affine indexing map to index operands.
    pub fn apply_indexing(map: IndexMap, operands: Vec<Arc<Self>>) -> Result<Arc<Self>> {
        ensure!(
            map.single_result().is_some(),
            MultiResultIndexingSnafu { results: map.results().len() }
        );
        ensure!(
            operands.len() == map.num_dims(),
            IndexMapAritySnafu { expected: map.num_dims(), actual: operands.len() }
        );
        ensure_offsets_indexed(&operands)?;
        Ok(Self::new(Op::ApplyIndexing { map, operands: SmallVec::from_vec(operands) }, DType::INDEX))
    }

    // =========================================================================
    // Domain casts
    // =========================================================================

    /// Cast a tensor value to a raw pointer type (or a retyped argument back
    /// to its tensor view; the conversion is erased by later passes).
    pub fn ptr_cast(src: Arc<Self>, ptr_type: DType) -> Result<Arc<Self>> {
        ensure!(ptr_type.is_ptr(), NotAPointerSnafu { actual: ptr_type.clone() });
        Ok(Self::new(Op::PtrCast { src }, ptr_type))
    }

    /// Cast a retyped argument back to its tensor view.
    pub fn tensor_cast(src: Arc<Self>, tensor_type: DType) -> Result<Arc<Self>> {
        ensure!(tensor_type.is_tensor(), NotATensorSnafu { actual: tensor_type.clone() });
        Ok(Self::new(Op::TensorCast { src }, tensor_type))
    }

    /// Cast a tensor value to a hardware-descriptor type.
    pub fn desc_cast(src: Arc<Self>, desc_type: DType) -> Result<Arc<Self>> {
        ensure!(
            matches!(desc_type, DType::TensorDesc { .. }),
            NotADescriptorSnafu { actual: desc_type.clone() }
        );
        Ok(Self::new(Op::DescCast { src }, desc_type))
    }

    // =========================================================================
    // Tile dialect
    // =========================================================================

    /// Extract a `tile_dims`-shaped tile from `src`.
    pub fn tile_extract(
        src: Arc<Self>,
        tile_dims: Vec<i64>,
        offsets: Vec<Arc<Self>>,
        strides: Vec<SInt>,
        layout: Layout,
    ) -> Result<Arc<Self>> {
        let (elem, dims) = tensor_parts(&src)?;
        let rank = dims.len();
        ensure_rank("tile shape", rank, tile_dims.len())?;
        ensure_rank("offsets", rank, offsets.len())?;
        ensure_rank("strides", rank, strides.len())?;
        ensure_rank("layout", rank, layout.len())?;
        ensure!(
            layout::is_permutation(&layout),
            InvalidPermutationSnafu { permutation: layout.to_vec(), expected_dims: rank }
        );
        ensure_offsets_indexed(&offsets)?;

        let dtype = DType::tensor(elem, tile_dims);
        Ok(Self::new(
            Op::TileExtract {
                src,
                offsets: SmallVec::from_vec(offsets),
                strides: SmallVec::from_vec(strides),
                layout,
            },
            dtype,
        ))
    }

    /// Insert `tile` into `dst`. Yields the destination tensor.
    pub fn tile_insert(
        tile: Arc<Self>,
        dst: Arc<Self>,
        offsets: Vec<Arc<Self>>,
        strides: Vec<SInt>,
        layout: Layout,
    ) -> Result<Arc<Self>> {
        let (_, tile_dims) = tensor_parts(&tile)?;
        let (_, dims) = tensor_parts(&dst)?;
        let rank = dims.len();
        ensure_rank("tile shape", rank, tile_dims.len())?;
        ensure_rank("offsets", rank, offsets.len())?;
        ensure_rank("strides", rank, strides.len())?;
        ensure_rank("layout", rank, layout.len())?;
        ensure!(
            layout::is_permutation(&layout),
            InvalidPermutationSnafu { permutation: layout.to_vec(), expected_dims: rank }
        );
        ensure_offsets_indexed(&offsets)?;

        let dtype = dst.dtype();
        Ok(Self::new(
            Op::TileInsert {
                tile,
                dst,
                offsets: SmallVec::from_vec(offsets),
                strides: SmallVec::from_vec(strides),
                layout,
            },
            dtype,
        ))
    }

    /// Read the single element of a tensor (meaningful for rank 0).
    pub fn scalar_extract(src: Arc<Self>) -> Result<Arc<Self>> {
        let (elem, _) = tensor_parts(&src)?;
        Ok(Self::new(Op::ScalarExtract { src }, DType::Scalar(elem)))
    }

    /// Write the single element of a tensor. Yields the destination.
    pub fn scalar_insert(dst: Arc<Self>, scalar: Arc<Self>) -> Result<Arc<Self>> {
        tensor_parts(&dst)?;
        let dtype = dst.dtype();
        Ok(Self::new(Op::ScalarInsert { dst, scalar }, dtype))
    }

    // =========================================================================
    // Pointer dialect
    // =========================================================================

    /// Advance `ptr` by `offset` elements. Keeps the pointer's type.
    pub fn add_ptr(ptr: Arc<Self>, offset: Arc<Self>) -> Result<Arc<Self>> {
        let dtype = ptr.dtype();
        ensure!(dtype.is_ptr(), NotAPointerSnafu { actual: dtype.clone() });
        Ok(Self::new(Op::AddPtr { ptr, offset }, dtype))
    }

    /// Build a tile pointer over `tile_shape`-shaped blocks.
    pub fn make_tensor_ptr(
        ptr: Arc<Self>,
        extents: Vec<Arc<Self>>,
        strides: Vec<Arc<Self>>,
        offsets: Vec<Arc<Self>>,
        tile_shape: Vec<i64>,
        order: SmallVec<[usize; 4]>,
    ) -> Result<Arc<Self>> {
        let ptr_type = ptr.dtype();
        ensure!(ptr_type.is_ptr(), NotAPointerSnafu { actual: ptr_type });
        let rank = tile_shape.len();
        ensure_rank("extents", rank, extents.len())?;
        ensure_rank("strides", rank, strides.len())?;
        ensure_rank("offsets", rank, offsets.len())?;
        ensure_rank("order", rank, order.len())?;

        // elem() looks through the pointer to the element type.
        let Some(elem) = ptr.dtype().elem() else {
            return NotAPointerSnafu { actual: ptr.dtype() }.fail();
        };
        let dtype = DType::ptr_to(DType::tensor(elem, tile_shape.clone()), tessel_dtype::AddrSpace::Global);
        Ok(Self::new(
            Op::MakeTensorPtr {
                ptr,
                extents: SmallVec::from_vec(extents),
                strides: SmallVec::from_vec(strides),
                offsets: SmallVec::from_vec(offsets),
                tile_shape: SmallVec::from_vec(tile_shape),
                order,
            },
            dtype,
        ))
    }

    /// Load through a pointer. The result type is the pointer's pointee:
    /// a tile tensor for tile pointers, a scalar for raw pointers.
    pub fn load(
        ptr: Arc<Self>,
        boundary_checks: SmallVec<[usize; 4]>,
        padding: Option<PaddingMode>,
    ) -> Result<Arc<Self>> {
        let dtype = match ptr.dtype() {
            DType::Ptr { base, .. } => *base,
            other => return NotAPointerSnafu { actual: other }.fail(),
        };
        Ok(Self::new(
            Op::Load {
                ptr,
                boundary_checks,
                padding,
                cache: CacheModifier::default(),
                eviction: EvictionPolicy::default(),
                volatile: false,
            },
            dtype,
        ))
    }

    /// Store `value` through a pointer. `forwards` is the destination tensor
    /// type this store stands for in SSA.
    pub fn store(
        ptr: Arc<Self>,
        value: Arc<Self>,
        boundary_checks: SmallVec<[usize; 4]>,
        forwards: DType,
    ) -> Result<Arc<Self>> {
        let ptr_type = ptr.dtype();
        ensure!(ptr_type.is_ptr(), NotAPointerSnafu { actual: ptr_type });
        Ok(Self::new(
            Op::Store {
                ptr,
                value,
                boundary_checks,
                cache: CacheModifier::default(),
                eviction: EvictionPolicy::default(),
            },
            forwards,
        ))
    }

    // =========================================================================
    // Descriptor dialect
    // =========================================================================

    /// Descriptor load of one tile at normalized, i32-cast offsets.
    pub fn descriptor_load(desc: Arc<Self>, offsets: Vec<Arc<Self>>) -> Result<Arc<Self>> {
        let dtype = match desc.dtype() {
            DType::TensorDesc { elem, tile_dims } => {
                ensure_rank("offsets", tile_dims.len(), offsets.len())?;
                DType::tensor(elem, tile_dims)
            }
            other => return NotADescriptorSnafu { actual: other }.fail(),
        };
        Ok(Self::new(Op::DescriptorLoad { desc, offsets: SmallVec::from_vec(offsets) }, dtype))
    }

    /// Descriptor store of one tile. `forwards` is the destination tensor
    /// type this store stands for in SSA.
    pub fn descriptor_store(
        desc: Arc<Self>,
        value: Arc<Self>,
        offsets: Vec<Arc<Self>>,
        forwards: DType,
    ) -> Result<Arc<Self>> {
        let desc_type = desc.dtype();
        ensure!(
            matches!(desc_type, DType::TensorDesc { .. }),
            NotADescriptorSnafu { actual: desc_type }
        );
        Ok(Self::new(
            Op::DescriptorStore { desc, value, offsets: SmallVec::from_vec(offsets) },
            forwards,
        ))
    }

    /// Permute tensor dimensions: `result dim i = src dim order[i]`.
    pub fn transpose(src: Arc<Self>, order: SmallVec<[usize; 4]>) -> Result<Arc<Self>> {
        let (elem, dims) = tensor_parts(&src)?;
        ensure!(
            order.len() == dims.len() && layout::is_permutation(&order),
            InvalidPermutationSnafu { permutation: order.to_vec(), expected_dims: dims.len() }
        );
        let new_dims: Vec<i64> = order.iter().map(|&o| dims[o]).collect();
        let dtype = DType::tensor(elem, new_dims);
        Ok(Self::new(Op::Transpose { src, order }, dtype))
    }

    // =========================================================================
    // Terminators
    // =========================================================================

    pub fn return_(values: Vec<Arc<Self>>) -> Arc<Self> {
        Self::new(Op::Return { values: SmallVec::from_vec(values) }, DType::Void)
    }

    pub fn sink(sources: Vec<Arc<Self>>) -> Arc<Self> {
        Self::new(Op::Sink { sources: SmallVec::from_vec(sources) }, DType::Void)
    }
}
