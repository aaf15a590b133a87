//! Tile-access lowering for the tessel GPU code generator.
//!
//! Rewrites tile-extract/tile-insert operations into one of two lowerings,
//! chosen per access site by a hardware legality oracle:
//!
//! - **descriptor path**: a bulk asynchronous copy descriptor load/store,
//!   legal only under strict alignment/shape constraints; the accessed
//!   function argument gains descriptor metadata attributes
//! - **generic path**: pointer advance + tile pointer + masked load/store,
//!   always legal
//!
//! The pass runs two ordered sweeps over each function: the access-site
//! rules to a fixed point, then the signature rewrite, which must see the
//! final per-argument attribute state. Rewriting is single-threaded and
//! synchronous; a rule either fully builds its replacement and swaps it in
//! atomically, or makes no change.

pub mod address;
pub mod context;
pub mod error;
pub mod legality;
pub mod rules;
pub mod signature;

#[cfg(test)]
mod test;

use snafu::{ResultExt, ensure};

use tessel_device::DeviceDescription;
use tessel_ir::{Function, Module, graph_rewrite_bottom_up};

pub use context::LoweringContext;
pub use error::{Error, Result};

/// The tile-access lowering pass.
pub struct TileAccessLoweringPass {
    device: DeviceDescription,
    tma_enabled: bool,
}

impl TileAccessLoweringPass {
    pub fn new(device: DeviceDescription, tma_enabled: bool) -> Self {
        Self { device, tma_enabled }
    }

    /// Build the pass from its serialized options: the capability descriptor
    /// text (empty means "no special features") and the fast-path flag.
    /// Malformed text fails here, before any rewriting.
    pub fn from_options(device_text: &str, tma_enabled: bool) -> Result<Self> {
        let device = DeviceDescription::from_text(device_text).context(error::DeviceConfigSnafu)?;
        Ok(Self::new(device, tma_enabled))
    }

    /// Run the pass over every function in the module.
    pub fn run(&self, module: &mut Module) -> Result<()> {
        for func in &mut module.functions {
            self.lower_function(func);
        }

        // Signature rewriting is a separate, later sweep: it reads the
        // attribute state the access rules left behind.
        for func in &mut module.functions {
            signature::rewrite_signature(func);
        }

        for func in &module.functions {
            let unlowered =
                func.body.toposort().iter().filter(|node| node.key().is_tile_access()).count();
            ensure!(
                unlowered == 0,
                error::UnloweredAccessSnafu { function: func.name.clone(), count: unlowered }
            );
        }
        Ok(())
    }

    fn lower_function(&self, func: &mut Function) {
        tracing::debug!(function = %func.name, tma_enabled = self.tma_enabled, "lowering tile accesses");
        let matcher = rules::access_patterns();
        let mut ctx = LoweringContext::new(&self.device, self.tma_enabled, func);
        func.body = graph_rewrite_bottom_up(&matcher, func.body.clone(), &mut ctx);
        ctx.commit(func);
    }
}
