pub use tessel_runtime::*;

#[cfg(feature = "blas")]
pub use tessel_blas as blas;

/// Types and entry points of everyday use.
pub mod prelude {
    pub use tessel_runtime::{Buffer, DeviceProperties, Event, Queue, TargetFamily, wait};

    #[cfg(feature = "blas")]
    pub use tessel_blas::{
        BlasError, ConfigError, Element, ExecuteOptions, ExecutionContext, Operation, Transpose,
        asum, axpy, copy, dot, gbmv, gemm, gemm_batched, gemm_strided_batched, gemv, iamax,
        iamin, nrm2, reduce, rot, rotg, rotmg, scal, sum, swap,
    };
}
