//! BLAS-style entry points.
//!
//! Each call selects the configuration of the operation for the device of the context, builds
//! the descriptor and enqueues it. Matrices are column-major and transpose flags are the BLAS
//! characters `n`, `t` and `c`.

mod blas1;
mod blas2;
mod blas3;
mod extension;

pub use blas1::*;
pub use blas2::*;
pub use blas3::*;
pub use extension::*;
