use snafu::Snafu;

use tessel_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Layout or transpose order is not a permutation of `0..rank`.
    #[snafu(display("invalid permutation {permutation:?}: expected permutation of 0..{expected_dims}"))]
    InvalidPermutation { permutation: Vec<usize>, expected_dims: usize },

    /// Per-dimension operand lists disagree on rank.
    #[snafu(display("rank mismatch for {what}: expected {expected} entries, got {actual}"))]
    RankMismatch { what: &'static str, expected: usize, actual: usize },

    /// Offset operands must have Index dtype.
    #[snafu(display("offset must have Index dtype, got {actual:?}"))]
    IndexTypeMismatch { actual: DType },

    /// Operation requires a ranked tensor operand.
    #[snafu(display("expected a ranked tensor, got {actual:?}"))]
    NotATensor { actual: DType },

    /// Operation requires a pointer operand.
    #[snafu(display("expected a pointer, got {actual:?}"))]
    NotAPointer { actual: DType },

    /// Operation requires a tensor-descriptor operand.
    #[snafu(display("expected a tensor descriptor, got {actual:?}"))]
    NotADescriptor { actual: DType },

    /// Indexing map applied to the wrong number of operands.
    #[snafu(display("indexing map expects {expected} operands, got {actual}"))]
    IndexMapArity { expected: usize, actual: usize },

    /// Indexing ops produce exactly one value.
    #[snafu(display("indexing map must have a single result, got {results}"))]
    MultiResultIndexing { results: usize },
}
