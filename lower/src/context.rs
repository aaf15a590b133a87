//! The per-function rewrite context.
//!
//! Pass configuration (device facts + fast-path flag) is immutable and
//! threaded into every rule invocation; mutable state is limited to the
//! descriptor attributes accumulated for the function being rewritten.

use std::collections::BTreeMap;

use tessel_device::DeviceDescription;
use tessel_ir::{Function, TmaDescriptor};

pub struct LoweringContext<'d> {
    device: &'d DeviceDescription,
    tma_enabled: bool,
    /// Operand-reference counts per argument, computed on the pre-rewrite
    /// body (each access is consumed exactly once by this pass).
    arg_use_counts: Vec<usize>,
    /// Descriptor metadata pending commit into the function's argument
    /// attribute table.
    tma_attrs: BTreeMap<usize, TmaDescriptor>,
}

impl<'d> LoweringContext<'d> {
    pub fn new(device: &'d DeviceDescription, tma_enabled: bool, func: &Function) -> Self {
        Self {
            device,
            tma_enabled,
            arg_use_counts: func.arg_use_counts(),
            tma_attrs: BTreeMap::new(),
        }
    }

    pub fn device(&self) -> &DeviceDescription {
        self.device
    }

    pub const fn tma_enabled(&self) -> bool {
        self.tma_enabled
    }

    pub fn arg_use_count(&self, index: usize) -> usize {
        self.arg_use_counts.get(index).copied().unwrap_or(0)
    }

    /// Record descriptor metadata for an argument. Write-once per argument:
    /// the single-accessor precondition means no access site revisits an
    /// argument that is already marked.
    pub fn record_tma_attributes(&mut self, index: usize, descriptor: TmaDescriptor) {
        let previous = self.tma_attrs.insert(index, descriptor);
        debug_assert!(previous.is_none(), "argument {index} marked for the fast path twice");
    }

    /// Move the recorded attributes into the function's argument table.
    pub fn commit(self, func: &mut Function) {
        for (index, descriptor) in self.tma_attrs {
            if let Some(attrs) = func.arg_attrs.get_mut(index) {
                attrs.tma_descriptor = Some(descriptor);
            }
        }
    }
}
