use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecutionContext, Transpose,
    backend::dispatch_gemm,
    config::BatchLayout,
    launcher::GemmLauncher,
    operation::GemmProblem,
};

/// `C := alpha * op(A) * op(B) + beta * C`, `op(A)` is `m × k` and `op(B)` is `k × n`.
#[allow(clippy::too_many_arguments)]
pub fn gemm<E: Element>(
    context: &ExecutionContext,
    trans_a: char,
    trans_b: char,
    m: usize,
    n: usize,
    k: usize,
    alpha: E,
    a: &Buffer<E>,
    lda: usize,
    b: &Buffer<E>,
    ldb: usize,
    beta: E,
    c: &Buffer<E>,
    ldc: usize,
) -> Result<Vec<Event>, ConfigError> {
    let problem = GemmProblem::new(
        Transpose::from_char(trans_a)?,
        Transpose::from_char(trans_b)?,
        m,
        n,
        k,
    )
    .with_leading_dims(lda, ldb, ldc);

    launch_gemm(context, problem, alpha, a, b, beta, c)
}

/// [gemm] over `batch_size` matrices stored back to back, or interleaved element by element.
#[allow(clippy::too_many_arguments)]
pub fn gemm_batched<E: Element>(
    context: &ExecutionContext,
    trans_a: char,
    trans_b: char,
    m: usize,
    n: usize,
    k: usize,
    alpha: E,
    a: &Buffer<E>,
    lda: usize,
    b: &Buffer<E>,
    ldb: usize,
    beta: E,
    c: &Buffer<E>,
    ldc: usize,
    batch_size: usize,
    batch_layout: BatchLayout,
) -> Result<Vec<Event>, ConfigError> {
    let problem = GemmProblem::new(
        Transpose::from_char(trans_a)?,
        Transpose::from_char(trans_b)?,
        m,
        n,
        k,
    )
    .with_leading_dims(lda, ldb, ldc)
    .with_batch(batch_size, batch_layout);

    launch_gemm(context, problem, alpha, a, b, beta, c)
}

/// [gemm] over `batch_size` matrices separated by explicit strides.
#[allow(clippy::too_many_arguments)]
pub fn gemm_strided_batched<E: Element>(
    context: &ExecutionContext,
    trans_a: char,
    trans_b: char,
    m: usize,
    n: usize,
    k: usize,
    alpha: E,
    a: &Buffer<E>,
    lda: usize,
    stride_a: usize,
    b: &Buffer<E>,
    ldb: usize,
    stride_b: usize,
    beta: E,
    c: &Buffer<E>,
    ldc: usize,
    stride_c: usize,
    batch_size: usize,
) -> Result<Vec<Event>, ConfigError> {
    let problem = GemmProblem::new(
        Transpose::from_char(trans_a)?,
        Transpose::from_char(trans_b)?,
        m,
        n,
        k,
    )
    .with_leading_dims(lda, ldb, ldc)
    .with_batch(batch_size, BatchLayout::Strided)
    .with_batch_strides(stride_a, stride_b, stride_c);

    launch_gemm(context, problem, alpha, a, b, beta, c)
}

/// Select the configuration of a problem for the device of the context and launch it.
pub fn launch_gemm<E: Element>(
    context: &ExecutionContext,
    problem: GemmProblem,
    alpha: E,
    a: &Buffer<E>,
    b: &Buffer<E>,
    beta: E,
    c: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    let config = dispatch_gemm::<E>(context.properties(), &problem)?;
    GemmLauncher::new(config).launch(context, problem, alpha, a, b, beta, c)
}
