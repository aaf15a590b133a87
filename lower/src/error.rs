use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Input contract violation: a zero tile stride next to non-unit
    /// dimensions is not representable downstream.
    #[snafu(display(
        "tile stride at index {index} is 0, but the tile shape there is {tile_dim} and the \
         original shape is {global_dim}; expected one of them to be 1"
    ))]
    TileStrideContract { index: usize, tile_dim: i64, global_dim: i64 },

    /// The pass was configured with unparseable capability text.
    #[snafu(display("invalid pass configuration: {source}"))]
    DeviceConfig { source: tessel_device::Error },

    /// Replacement construction failed mid-rule; the rule declines and the
    /// access is left untouched.
    #[snafu(display("failed to build replacement: {source}"))]
    Build { source: tessel_ir::Error },

    /// Accesses survived both rewrite sweeps.
    #[snafu(display("function '{function}': {count} tile access operation(s) survived lowering"))]
    UnloweredAccess { function: String, count: usize },
}

impl From<tessel_ir::Error> for Error {
    fn from(source: tessel_ir::Error) -> Self {
        Error::Build { source }
    }
}
