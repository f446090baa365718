use pretty_assertions::assert_eq;
use tessel_runtime::{Event, TargetFamily};

use super::utils::*;
use crate::{
    ConfigError, Element, ExecuteOptions, ExecutionContext, Transpose,
    backend::{select, select_gemv},
    config::{BatchLayout, GemvMemory},
    gemm,
    operation::{ReduceOperator, Reduction, ReductionDim, ReductionProblem},
};

pub fn test_selection_is_deterministic<E: Element>(context: &ExecutionContext) {
    let family = context.family();

    for (m, n) in [(1, 1), (511, 511), (512, 64), (3000, 17)] {
        for layout in [BatchLayout::Strided, BatchLayout::Interleaved] {
            assert_eq!(select(m, n, layout, family), select(m, n, layout, family));
        }
    }

    for (m, rows) in [(1024, 8), (600, 16), (100, 32)] {
        let config = select_gemv(m, Transpose::Transposed, family);
        assert_eq!(config.rows, rows, "transposed gemv of {m} rows");

        let config = select_gemv(m, Transpose::Normal, family);
        assert_eq!((config.rows, config.workgroup_size), (32, 64));
        assert_eq!(config.memory, GemvMemory::Local);
    }
}

pub fn test_no_local_memory_device<E: Element>(_context: &ExecutionContext) {
    let context = no_local_context();
    let (a, _) = random_buffer::<E>(&context, 64, 501);
    let (b, _) = random_buffer::<E>(&context, 64, 502);
    let c = context.queue().empty::<E>(64);

    let result = gemm(
        &context,
        'n',
        'n',
        8,
        8,
        8,
        E::one(),
        &a,
        8,
        &b,
        8,
        E::zero(),
        &c,
        8,
    );
    assert!(matches!(
        result,
        Err(ConfigError::LocalMemoryUnsupported { .. })
    ));

    let partials = context.queue().empty::<E>(8);
    let reduction = Reduction::new(
        ReduceOperator::Add,
        ReductionProblem::new(8, 8, ReductionDim::Inner),
        &a,
        &partials,
    )
    .unwrap();
    assert_eq!(
        context.execute(reduction.into()).err(),
        Some(ConfigError::LocalMemoryUnsupported {
            parameter: "local_memory_size",
        })
    );

    // The interleaved configuration never stages tiles.
    super::gemm::test_gemm_interleaved_batch::<E>(&context);
}

pub fn test_chained_operations<E: Element>(context: &ExecutionContext) {
    let (rows, cols) = (64, 16);
    let (input, input_host) = random_buffer::<E>(context, rows * cols, 511);
    let columns = context.queue().empty::<E>(cols);
    let total = context.queue().empty::<E>(1);

    let first = Reduction::new(
        ReduceOperator::Add,
        ReductionProblem::new(rows, cols, ReductionDim::Inner),
        &input,
        &columns,
    )
    .unwrap();
    let events = context.execute(first.into()).unwrap();

    let second = Reduction::new(
        ReduceOperator::Add,
        ReductionProblem::new(cols, 1, ReductionDim::Inner),
        &columns,
        &total,
    )
    .unwrap();
    let events = context
        .execute_with(second.into(), ExecuteOptions::new().after(events))
        .unwrap();
    context.wait(events).unwrap();

    let expected = input_host.iter().fold(E::zero(), |acc, value| acc + *value);
    assert_equals_approx(&read_buffer(context, &total).unwrap(), &[expected], 0.0).unwrap();
}

pub fn test_wait_without_events<E: Element>(context: &ExecutionContext) {
    context.wait(()).unwrap();
    context.wait(Vec::<Event>::new()).unwrap();
    context.wait(Event::complete()).unwrap();

    let (input, _) = random_buffer::<E>(context, 32, 521);
    let output = context.queue().empty::<E>(1);
    let reduction = Reduction::new(
        ReduceOperator::Max,
        ReductionProblem::new(32, 1, ReductionDim::Inner),
        &input,
        &output,
    )
    .unwrap();
    // Events are dropped on purpose, the queue still tracks the kernel.
    let _ = context.execute(reduction.into()).unwrap();
    context.wait_all().unwrap();
}

pub fn test_family_tables<E: Element>(_context: &ExecutionContext) {
    for family in [TargetFamily::Rcar, TargetFamily::Generic] {
        let context = ExecutionContext::new(tessel_runtime::Queue::new(test_device(family)));
        assert_eq!(context.family(), family);
        super::gemm::test_gemm_256_selects_small_config::<E>(&context);
        super::gemm::test_gemm_tall_skinny::<E>(&context);
    }
}
