//! Launchers bind one compiled configuration to operation descriptors.
//!
//! A launcher trusts its configuration: device capabilities are checked once, when the
//! [backend](crate::backend) dispatcher selects it.

mod gemm;
mod gemv;

pub use gemm::*;
pub use gemv::*;
