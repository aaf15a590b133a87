//! Device capability descriptions for the tessel lowering pipeline.
//!
//! A [`DeviceDescription`] is a static record of hardware facts. It is owned
//! by the caller, immutable for a pass's lifetime, and queried by the
//! lowering pass to decide whether the bulk-copy fast path is available.

pub mod descriptor;
pub mod error;

#[cfg(test)]
mod test;

pub use descriptor::{ComputeCapability, DeviceDescription};
pub use error::{Error, Result};
