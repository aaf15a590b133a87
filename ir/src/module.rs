//! Functions, modules, and per-argument attributes.
//!
//! A [`Function`] owns its signature, a body DAG rooted at a terminator, and
//! one [`ArgAttributes`] record per argument. The attribute records are the
//! typed side table the lowering pass writes (descriptor metadata at access
//! rewrite time) and the signature rewrite reads.

use std::sync::Arc;

use smallvec::SmallVec;

use tessel_dtype::DType;

use crate::layout::Layout;
use crate::op::Op;
use crate::uop::UOp;

/// Hardware bulk-copy descriptor metadata recorded on a function argument
/// chosen for the fast path. Read by the signature rewrite and by downstream
/// consumers outside this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmaDescriptor {
    /// Dimensions of the full tensor.
    pub global_shape: SmallVec<[i64; 4]>,
    /// Dimensions of one tile.
    pub tile_shape: SmallVec<[i64; 4]>,
    /// Canonicalized per-dimension tile strides.
    pub tile_strides: SmallVec<[i64; 4]>,
    /// Minor-to-major layout of the tensor.
    pub layout: Layout,
    /// Byte width of one element.
    pub element_byte_size: u64,
}

/// Per-argument attribute dictionary.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArgAttributes {
    /// Present exactly when the argument was chosen for the descriptor fast
    /// path. Write-once per argument per pass.
    pub tma_descriptor: Option<TmaDescriptor>,

    /// "Base address divisible by this many bytes" hint. Stamped on every
    /// non-descriptor tensor argument by the signature rewrite.
    pub divisibility: Option<u32>,
}

/// A function: ordered argument/result types and a body DAG rooted at a
/// terminator ([`Op::Return`] before lowering, [`Op::Sink`] after).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub arg_types: Vec<DType>,
    pub result_types: Vec<DType>,
    pub arg_attrs: Vec<ArgAttributes>,
    pub body: Arc<UOp>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        arg_types: Vec<DType>,
        result_types: Vec<DType>,
        body: Arc<UOp>,
    ) -> Self {
        let arg_attrs = vec![ArgAttributes::default(); arg_types.len()];
        Self { name: name.into(), arg_types, result_types, arg_attrs, body }
    }

    /// Number of operand references to each argument in the body.
    ///
    /// Counted over unique nodes: one use per (parent, operand slot) edge,
    /// which is what "used exactly once" means for the fast-path gate.
    pub fn arg_use_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.arg_types.len()];
        for node in self.body.toposort() {
            for src in node.sources() {
                if let Op::Arg { index } = src.op()
                    && let Some(count) = counts.get_mut(*index)
                {
                    *count += 1;
                }
            }
        }
        // The root itself can be an argument reference (degenerate body).
        if let Op::Arg { index } = self.body.op()
            && let Some(count) = counts.get_mut(*index)
        {
            *count += 1;
        }
        counts
    }
}

/// A collection of functions rewritten together by one pass invocation.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }
}
