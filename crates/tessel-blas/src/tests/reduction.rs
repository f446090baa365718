use pretty_assertions::assert_eq;
use super::utils::*;
use crate::{
    ConfigError, Element, ExecuteOptions, ExecutionContext,
    operation::{ReduceOperator, Reduction, ReductionDim, ReductionProblem},
    reduce, reduce_scaled,
};

/// Expected results of a packed-output reduction, one per output index.
fn expected_reduction<E: Element>(
    operator: ReduceOperator,
    problem: &ReductionProblem,
    input: &[E],
) -> Vec<E> {
    (0..problem.output_len())
        .map(|index| {
            let acc = (0..problem.reduced_len()).fold(operator.identity::<E>(), |acc, other| {
                let (row, col) = match problem.dim {
                    ReductionDim::Inner => (other, index),
                    ReductionDim::Outer => (index, other),
                };
                operator.accumulate(acc, input[row + col * problem.ld])
            });
            operator.finalize(acc, problem.reduced_len())
        })
        .collect()
}

pub fn test_reduction_both_dims<E: Element>(context: &ExecutionContext) {
    let operators = [
        ReduceOperator::Add,
        ReduceOperator::Product,
        ReduceOperator::Max,
        ReduceOperator::Min,
        ReduceOperator::Mean,
        ReduceOperator::AbsoluteAdd,
        ReduceOperator::SquareAdd,
    ];

    for dim in [ReductionDim::Inner, ReductionDim::Outer] {
        for (rows, cols) in [(1, 1), (37, 5), (3, 300), (513, 2)] {
            for operator in operators {
                let problem = ReductionProblem::new(rows, cols, dim).with_leading_dim(rows + 1);
                let (input, input_host) = random_buffer::<E>(context, (rows + 1) * cols, 401);
                let output = context.queue().empty::<E>(problem.output_len());

                context
                    .wait(reduce(context, operator, problem, &input, &output).unwrap())
                    .unwrap();

                // Long products of quarter values lose exactness.
                if operator == ReduceOperator::Product && problem.reduced_len() > 5 {
                    continue;
                }
                let epsilon = tolerance::<E>(rows, cols, 1, 64.0);
                let expected = expected_reduction(operator, &problem, &input_host);
                let actual = read_buffer(context, &output).unwrap();
                assert_equals_approx(&actual, &expected, epsilon).unwrap_or_else(|err| {
                    panic!("{operator:?} {dim:?} {rows}x{cols}: {err}");
                });
            }
        }
    }
}

pub fn test_reduction_epilogue_and_layout<E: Element>(context: &ExecutionContext) {
    let (rows, cols, batch) = (12, 9, 2);
    let problem = ReductionProblem::new(rows, cols, ReductionDim::Outer)
        .with_output_layout(4, 6)
        .with_batch(batch, rows * cols, 20);
    let (input, input_host) = random_buffer::<E>(context, rows * cols * batch, 411);
    let (output, output_host) = random_buffer::<E>(context, 40, 412);
    let (alpha, beta) = (E::from_double(2.0), E::from_double(0.5));

    context
        .wait(
            reduce_scaled(
                context,
                ReduceOperator::Add,
                problem,
                alpha,
                &input,
                beta,
                &output,
            )
            .unwrap(),
        )
        .unwrap();
    let actual = read_buffer(context, &output).unwrap();

    let mut expected = output_host;
    for index in 0..batch {
        let single = ReductionProblem::new(rows, cols, ReductionDim::Outer);
        let sums = expected_reduction(
            ReduceOperator::Add,
            &single,
            &input_host[index * rows * cols..],
        );
        for (row, sum) in sums.into_iter().enumerate() {
            let offset = problem.output_offset(index, row);
            expected[offset] = alpha * sum + beta * expected[offset];
        }
    }
    assert_equals_approx(&actual, &expected, 0.0).unwrap();
}

pub fn test_reduction_launch_overrides<E: Element>(context: &ExecutionContext) {
    let problem = ReductionProblem::new(64, 16, ReductionDim::Inner);
    let (input, input_host) = random_buffer::<E>(context, 64 * 16, 421);
    let output = context.queue().empty::<E>(16);
    let max = context.max_workgroup_size();

    let describe = || Reduction::new(ReduceOperator::Add, problem, &input, &output).unwrap();

    let result = context.execute_with(
        describe().into(),
        ExecuteOptions::new().with_local_size(max + 1),
    );
    assert!(matches!(
        result,
        Err(ConfigError::WorkgroupTooLarge {
            parameter: "local_size",
            ..
        })
    ));

    let result = context.execute_with(
        describe().into(),
        ExecuteOptions::new().with_local_size(32).with_global_size(48),
    );
    assert!(matches!(
        result,
        Err(ConfigError::InvalidArgument {
            name: "global_size",
            ..
        })
    ));

    let result = context.execute_with(
        describe().into(),
        ExecuteOptions::new()
            .with_local_size(32)
            .with_local_memory_size(16),
    );
    assert!(matches!(
        result,
        Err(ConfigError::InvalidArgument {
            name: "local_memory_size",
            ..
        })
    ));

    let result = context.execute_with(
        describe().into(),
        ExecuteOptions::new()
            .with_local_size(32)
            .with_local_memory_size(context.max_local_memory_size() + 1),
    );
    assert!(matches!(
        result,
        Err(ConfigError::LocalMemoryTooLarge { .. })
    ));

    // Fewer workgroups than columns, each one folds several columns.
    let events = context
        .execute_with(
            describe().into(),
            ExecuteOptions::new()
                .with_local_size(32)
                .with_global_size(96)
                .with_local_memory_size(32 * size_of::<E>()),
        )
        .unwrap();
    context.wait(events).unwrap();

    let expected = expected_reduction(ReduceOperator::Add, &problem, &input_host);
    assert_equals_approx(&read_buffer(context, &output).unwrap(), &expected, 0.0).unwrap();
}

pub fn test_reduction_rejects_short_output<E: Element>(context: &ExecutionContext) {
    let problem = ReductionProblem::new(8, 8, ReductionDim::Inner).with_output_layout(2, 3);
    let (input, _) = random_buffer::<E>(context, 64, 431);
    // The last of the 8 results lands at 7 % 2 + (7 / 2) * 3 = 10.
    let output = context.queue().empty::<E>(10);

    let result = reduce(context, ReduceOperator::Add, problem, &input, &output);
    assert_eq!(
        result.err(),
        Some(ConfigError::OperandTooSmall {
            operand: "output",
            required: 11,
            actual: 10,
        })
    );

    let output = context.queue().empty::<E>(11);
    let events = reduce(context, ReduceOperator::Add, problem, &input, &output).unwrap();
    context.wait(events).unwrap();
}
