use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecuteOptions, ExecutionContext, Transpose,
    backend::{dispatch_gbmv, dispatch_gemv},
    launcher::{GbmvLauncher, GemvLauncher},
    operation::{GbmvProblem, GemvProblem, StridedVector},
};

/// `y := alpha * op(A) * x + beta * y`, `A` is `m × n`.
#[allow(clippy::too_many_arguments)]
pub fn gemv<E: Element>(
    context: &ExecutionContext,
    trans: char,
    m: usize,
    n: usize,
    alpha: E,
    a: &Buffer<E>,
    lda: usize,
    x: &Buffer<E>,
    incx: usize,
    beta: E,
    y: &Buffer<E>,
    incy: usize,
) -> Result<Vec<Event>, ConfigError> {
    let trans = Transpose::from_char(trans)?;
    let problem = GemvProblem::new(trans, m, n).with_leading_dim(lda);
    let config = dispatch_gemv::<E>(context.properties(), m, trans)?;

    GemvLauncher::new(config).launch(
        context,
        problem,
        alpha,
        a,
        StridedVector::new(x, incx),
        beta,
        StridedVector::new(y, incy),
        ExecuteOptions::default(),
    )
}

/// `y := alpha * op(A) * x + beta * y`, `A` is `m × n` with `kl` sub-diagonals and `ku`
/// super-diagonals in band storage.
#[allow(clippy::too_many_arguments)]
pub fn gbmv<E: Element>(
    context: &ExecutionContext,
    trans: char,
    m: usize,
    n: usize,
    kl: usize,
    ku: usize,
    alpha: E,
    a: &Buffer<E>,
    lda: usize,
    x: &Buffer<E>,
    incx: usize,
    beta: E,
    y: &Buffer<E>,
    incy: usize,
) -> Result<Vec<Event>, ConfigError> {
    let trans = Transpose::from_char(trans)?;
    let problem = GbmvProblem::new(trans, m, n, kl, ku).with_leading_dim(lda);
    let config = dispatch_gbmv::<E>(context.properties())?;

    GbmvLauncher::new(config).launch(
        context,
        problem,
        alpha,
        a,
        StridedVector::new(x, incx),
        beta,
        StridedVector::new(y, incy),
        ExecuteOptions::default(),
    )
}
