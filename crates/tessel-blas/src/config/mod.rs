mod gemm;
mod gemv;

pub use gemm::*;
pub use gemv::*;
