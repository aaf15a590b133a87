//! Element and value types for the tessel IR.
//!
//! This crate defines the type vocabulary the lowering pipeline operates on:
//!
//! - [`ScalarDType`] - scalar element types with their byte widths
//! - [`DType`] - value types: scalars, pointers, ranked tensors, and the
//!   hardware bulk-copy descriptor type
//! - [`AddrSpace`] - pointer address spaces

/// Address space for pointer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddrSpace {
    /// Global/device memory.
    Global,
    /// Shared (workgroup-local) memory.
    Shared,
}

/// Scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarDType {
    Bool,

    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,

    FP8E4M3,
    FP8E5M2,
    Float16,
    BFloat16,
    Float32,
    Float64,

    /// Index type for offsets, extents, and loop bounds.
    Index,
}

impl ScalarDType {
    /// Byte width of one element.
    pub const fn bytes(&self) -> u64 {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 | Self::FP8E4M3 | Self::FP8E5M2 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            // Index lowers to a 64-bit integer on every supported target.
            Self::Index => 8,
        }
    }

    /// Bit width of one element.
    pub const fn bits(&self) -> u64 {
        self.bytes() * 8
    }

    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            Self::FP8E4M3 | Self::FP8E5M2 | Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64
        )
    }

    pub const fn is_int(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
                | Self::Index
        )
    }
}

/// Data type of an IR value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    /// Scalar value.
    Scalar(ScalarDType),

    /// Raw pointer into an address space.
    ///
    /// A pointer to a tensor type is a tile pointer: it addresses whole
    /// rectangular blocks rather than single elements.
    Ptr { base: Box<DType>, addrspace: AddrSpace },

    /// Ranked tensor with static dimensions (major-to-minor declared order).
    Tensor { elem: ScalarDType, dims: Vec<i64> },

    /// Hardware bulk-copy descriptor viewing `tile_dims`-shaped blocks of a
    /// tensor. Produced by the signature rewrite for fast-path arguments.
    TensorDesc { elem: ScalarDType, tile_dims: Vec<i64> },

    /// No value (terminators).
    Void,
}

impl DType {
    pub const BOOL: DType = DType::Scalar(ScalarDType::Bool);
    pub const INT32: DType = DType::Scalar(ScalarDType::Int32);
    pub const INT64: DType = DType::Scalar(ScalarDType::Int64);
    pub const FLOAT16: DType = DType::Scalar(ScalarDType::Float16);
    pub const BFLOAT16: DType = DType::Scalar(ScalarDType::BFloat16);
    pub const FLOAT32: DType = DType::Scalar(ScalarDType::Float32);
    pub const FLOAT64: DType = DType::Scalar(ScalarDType::Float64);
    pub const INDEX: DType = DType::Scalar(ScalarDType::Index);

    /// Ranked tensor type.
    pub fn tensor(elem: ScalarDType, dims: impl Into<Vec<i64>>) -> Self {
        DType::Tensor { elem, dims: dims.into() }
    }

    /// Pointer to `base` in `addrspace`.
    pub fn ptr_to(base: DType, addrspace: AddrSpace) -> Self {
        DType::Ptr { base: Box::new(base), addrspace }
    }

    /// Global-memory pointer to a scalar element.
    pub fn global_ptr(elem: ScalarDType) -> Self {
        Self::ptr_to(DType::Scalar(elem), AddrSpace::Global)
    }

    pub const fn is_tensor(&self) -> bool {
        matches!(self, DType::Tensor { .. })
    }

    pub const fn is_ptr(&self) -> bool {
        matches!(self, DType::Ptr { .. })
    }

    /// Rank of a tensor or descriptor type.
    pub fn rank(&self) -> Option<usize> {
        match self {
            DType::Tensor { dims, .. } | DType::TensorDesc { tile_dims: dims, .. } => Some(dims.len()),
            _ => None,
        }
    }

    /// Static dimensions of a tensor or descriptor type.
    pub fn dims(&self) -> Option<&[i64]> {
        match self {
            DType::Tensor { dims, .. } | DType::TensorDesc { tile_dims: dims, .. } => Some(dims),
            _ => None,
        }
    }

    /// Scalar element type of this value, looking through pointers.
    pub fn elem(&self) -> Option<ScalarDType> {
        match self {
            DType::Scalar(s) => Some(*s),
            DType::Ptr { base, .. } => base.elem(),
            DType::Tensor { elem, .. } | DType::TensorDesc { elem, .. } => Some(*elem),
            DType::Void => None,
        }
    }
}
