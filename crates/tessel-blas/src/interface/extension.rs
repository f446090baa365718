use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecutionContext,
    operation::{ReduceOperator, Reduction, ReductionProblem, VectorReduction},
};

use super::blas1::value_reduction;

/// Fold a column-major matrix along one dimension, overwriting the output.
pub fn reduce<E: Element>(
    context: &ExecutionContext,
    operator: ReduceOperator,
    problem: ReductionProblem,
    input: &Buffer<E>,
    output: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    let reduction = Reduction::new(operator, problem, input, output)?;
    context.execute(reduction.into())
}

/// `output := alpha * reduce(input) + beta * output`.
#[allow(clippy::too_many_arguments)]
pub fn reduce_scaled<E: Element>(
    context: &ExecutionContext,
    operator: ReduceOperator,
    problem: ReductionProblem,
    alpha: E,
    input: &Buffer<E>,
    beta: E,
    output: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    let reduction = Reduction::with_epilogue(operator, problem, alpha, input, beta, output)?;
    context.execute(reduction.into())
}

/// Fold `n` elements of a vector into `result[0]`.
///
/// Index reductions and dot products have their own entry points, see
/// [iamax](super::iamax) and [dot](super::dot).
pub fn reduce_vector<E: Element>(
    context: &ExecutionContext,
    kind: VectorReduction,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    value_reduction(context, kind, n, x, incx, result)
}

/// `result[0] := Σ x`.
pub fn sum<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    value_reduction(context, VectorReduction::Sum, n, x, incx, result)
}
