//! Intermediate representation for the tessel tile-access lowering pipeline.
//!
//! This crate defines the IR data structures and the rewrite machinery the
//! lowering pass runs on.
//!
//! # Module Organization
//!
//! - [`types`] - plain value types (constants, load/store policies)
//! - [`sint`] - static-or-symbolic integers (tile strides)
//! - [`op`] - operation enum defining the tile and pointer dialects
//! - [`uop`] - IR node ([`UOp`]) and its constructors
//! - [`layout`] - minor-to-major layout normalization and permutations
//! - [`indexing`] - affine indexing maps and divisibility analysis
//! - [`pattern`] - op-kind-indexed pattern matcher
//! - [`rewrite`] - fixed-point graph rewrite engine
//! - [`module`] - functions, modules, and per-argument attributes
//! - [`error`] - error types and result handling

pub mod error;
pub mod indexing;
pub mod layout;
pub mod module;
pub mod op;
pub mod pattern;
pub mod rewrite;
pub mod sint;
pub mod types;
pub mod uop;

#[cfg(test)]
mod test;

pub use error::{Error, Result};
pub use indexing::{AffineExpr, IndexMap};
pub use layout::Layout;
pub use module::{ArgAttributes, Function, Module, TmaDescriptor};
pub use op::{Op, OpKey};
pub use pattern::{PatternMatcher, RewriteResult};
pub use rewrite::{graph_rewrite, graph_rewrite_bottom_up};
pub use sint::SInt;
pub use types::{BinaryOp, CacheModifier, ConstValue, EvictionPolicy, PaddingMode};
pub use uop::{UOp, UOpKey};

// Re-export the type vocabulary for convenience.
pub use tessel_dtype::{AddrSpace, DType, ScalarDType};
