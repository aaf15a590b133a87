//! The hardware capability record and its text-format parsing.

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{MalformedDescriptorSnafu, Result};

/// GPU compute capability version.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

impl ComputeCapability {
    /// First architecture with a tensor memory accelerator engine.
    pub const HOPPER: ComputeCapability = ComputeCapability { major: 9, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_at_least(&self, other: ComputeCapability) -> bool {
        (self.major, self.minor) >= (other.major, other.minor)
    }
}

impl std::fmt::Display for ComputeCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Static hardware capability facts.
///
/// Defaults describe a device with no special features, which is what an
/// absent capability descriptor means to the lowering pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDescription {
    /// Marketing name, informational only.
    pub name: String,

    pub compute_capability: ComputeCapability,

    /// Total global memory in bytes.
    pub global_memory_bytes: u64,

    /// Shared memory available to one block, in bytes.
    pub shared_memory_per_block: u64,

    /// Number of streaming multiprocessors.
    pub core_count: u32,
}

impl DeviceDescription {
    /// Parse a description from its serialized text (JSON) form.
    ///
    /// Empty input yields the default description ("no special features").
    /// Malformed input is a configuration error, reported before any
    /// rewriting starts.
    pub fn from_text(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).context(MalformedDescriptorSnafu)
    }

    /// Whether the device has a tensor memory accelerator (bulk asynchronous
    /// copy) engine.
    pub fn supports_tma(&self) -> bool {
        self.compute_capability.is_at_least(ComputeCapability::HOPPER)
    }
}
