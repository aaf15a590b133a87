//! Affine indexing maps.
//!
//! An [`IndexMap`] bridges multi-dimensional offsets and linear positions.
//! The lowering pass uses it in two places: [`linearize_map`] computes the
//! flattened element offset of a layout-permuted tensor access, and
//! [`AffineExpr::is_multiple_of`] proves offset divisibility for the
//! fast-path legality check.

use smallvec::{SmallVec, smallvec};
use snafu::ensure;

use crate::error::{IndexMapAritySnafu, Result};

/// Affine expression over dimension inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AffineExpr {
    Const(i64),
    Dim(usize),
    Add(Box<AffineExpr>, Box<AffineExpr>),
    Mul(Box<AffineExpr>, Box<AffineExpr>),
    FloorDiv(Box<AffineExpr>, Box<AffineExpr>),
    Mod(Box<AffineExpr>, Box<AffineExpr>),
}

impl AffineExpr {
    pub const fn cst(value: i64) -> Self {
        AffineExpr::Const(value)
    }

    pub const fn dim(index: usize) -> Self {
        AffineExpr::Dim(index)
    }

    /// `self + rhs`, folding constants and dropping zero terms.
    pub fn add(self, rhs: AffineExpr) -> Self {
        match (self, rhs) {
            (AffineExpr::Const(a), AffineExpr::Const(b)) => AffineExpr::Const(a + b),
            (AffineExpr::Const(0), e) | (e, AffineExpr::Const(0)) => e,
            (a, b) => AffineExpr::Add(Box::new(a), Box::new(b)),
        }
    }

    /// `self * rhs`, folding constants and unit/zero factors.
    pub fn mul(self, rhs: AffineExpr) -> Self {
        match (self, rhs) {
            (AffineExpr::Const(a), AffineExpr::Const(b)) => AffineExpr::Const(a * b),
            (AffineExpr::Const(0), _) | (_, AffineExpr::Const(0)) => AffineExpr::Const(0),
            (AffineExpr::Const(1), e) | (e, AffineExpr::Const(1)) => e,
            (a, b) => AffineExpr::Mul(Box::new(a), Box::new(b)),
        }
    }

    /// Evaluate at concrete dimension values.
    pub fn evaluate(&self, dims: &[i64]) -> i64 {
        match self {
            AffineExpr::Const(v) => *v,
            AffineExpr::Dim(d) => dims[*d],
            AffineExpr::Add(a, b) => a.evaluate(dims) + b.evaluate(dims),
            AffineExpr::Mul(a, b) => a.evaluate(dims) * b.evaluate(dims),
            AffineExpr::FloorDiv(a, b) => a.evaluate(dims).div_euclid(b.evaluate(dims)),
            AffineExpr::Mod(a, b) => a.evaluate(dims).rem_euclid(b.evaluate(dims)),
        }
    }

    /// Whether this expression is provably a multiple of `factor` for every
    /// input assignment.
    ///
    /// A dimension input can take any value, so it only passes for factor 1.
    /// A product is a multiple if either factor is; a sum, quotient, or
    /// remainder only if both operands are.
    pub fn is_multiple_of(&self, factor: i64) -> bool {
        match self {
            AffineExpr::Const(v) => v % factor == 0,
            AffineExpr::Dim(_) => factor * factor == 1,
            AffineExpr::Mul(a, b) => a.is_multiple_of(factor) || b.is_multiple_of(factor),
            AffineExpr::Add(a, b) | AffineExpr::FloorDiv(a, b) | AffineExpr::Mod(a, b) => {
                a.is_multiple_of(factor) && b.is_multiple_of(factor)
            }
        }
    }
}

/// A multi-dimensional affine indexing map: `num_dims` inputs, one or more
/// result expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexMap {
    num_dims: usize,
    exprs: SmallVec<[AffineExpr; 1]>,
}

impl IndexMap {
    pub fn new(num_dims: usize, exprs: impl IntoIterator<Item = AffineExpr>) -> Self {
        Self { num_dims, exprs: exprs.into_iter().collect() }
    }

    pub const fn num_dims(&self) -> usize {
        self.num_dims
    }

    pub fn results(&self) -> &[AffineExpr] {
        &self.exprs
    }

    /// The sole result expression, or `None` if the map has several.
    pub fn single_result(&self) -> Option<&AffineExpr> {
        match self.exprs.as_slice() {
            [expr] => Some(expr),
            _ => None,
        }
    }

    /// Evaluate every result at concrete dimension values.
    pub fn evaluate(&self, dims: &[i64]) -> Result<SmallVec<[i64; 1]>> {
        ensure!(
            dims.len() == self.num_dims,
            IndexMapAritySnafu { expected: self.num_dims, actual: dims.len() }
        );
        Ok(self.exprs.iter().map(|e| e.evaluate(dims)).collect())
    }
}

/// The dense-to-linear bitcast map: given a tensor's static dimensions and
/// its minor-to-major layout, the single-result map taking per-dimension
/// offsets to the flattened element offset of the physical (layout-permuted)
/// representation.
pub fn linearize_map(dims: &[i64], layout: &[usize]) -> IndexMap {
    debug_assert_eq!(dims.len(), layout.len());

    // Physical element strides by cumulative product, minor to major.
    let mut strides: SmallVec<[i64; 4]> = smallvec![0; dims.len()];
    let mut current = 1i64;
    for &d in layout {
        strides[d] = current;
        current *= dims[d];
    }

    let mut expr = AffineExpr::Const(0);
    for (d, &stride) in strides.iter().enumerate() {
        expr = expr.add(AffineExpr::dim(d).mul(AffineExpr::cst(stride)));
    }
    IndexMap::new(dims.len(), [expr])
}
