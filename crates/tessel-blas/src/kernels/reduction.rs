use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, NdRange};

use super::{linear_ids, tree_reduce};
use crate::{
    Element,
    operation::{ReduceOperator, Reduction, ReductionDim, ReductionProblem},
};

/// Matrix to vector reduction.
///
/// Outer reductions give each work item whole rows. Inner reductions give each workgroup whole
/// columns, folded by a local memory tree.
#[derive(Debug)]
pub(crate) struct ReductionKernel<E: Element> {
    operator: ReduceOperator,
    problem: ReductionProblem,
    alpha: E,
    beta: E,
    input: Buffer<E>,
    output: Buffer<E>,
    range: NdRange,
    local_memory_size: usize,
}

impl<E: Element> ReductionKernel<E> {
    pub(crate) fn new(reduction: &Reduction<'_, E>, range: NdRange, local_memory_size: usize) -> Self {
        Self {
            operator: reduction.operator,
            problem: reduction.problem,
            alpha: reduction.alpha,
            beta: reduction.beta,
            input: reduction.input.clone(),
            output: reduction.output.clone(),
            range,
            local_memory_size,
        }
    }

    /// Local memory of one workgroup of `workgroup_size` items.
    pub(crate) fn local_memory_required(problem: &ReductionProblem, workgroup_size: u32) -> usize {
        match problem.dim {
            ReductionDim::Inner => workgroup_size as usize * size_of::<E>(),
            ReductionDim::Outer => 0,
        }
    }

    /// Default launch range.
    pub(crate) fn default_range(problem: &ReductionProblem, workgroup_size: u32) -> NdRange {
        let tasks = problem.output_len() * problem.batch_count;
        match problem.dim {
            ReductionDim::Inner => NdRange::groups_1d(tasks.max(1) as u32, workgroup_size),
            ReductionDim::Outer => super::linear_range(tasks, workgroup_size),
        }
    }

    fn input_offset(&self, batch: usize, row: usize, col: usize) -> usize {
        batch * self.problem.input_stride + row + col * self.problem.ld
    }

    fn write(&self, output: &mut [E], batch: usize, index: usize, acc: E) {
        let offset = self.problem.output_offset(batch, index);
        let value = self.alpha
            * self
                .operator
                .finalize(acc, self.problem.reduced_len());

        output[offset] = match self.beta == E::zero() {
            true => value,
            false => value + self.beta * output[offset],
        };
    }
}

impl<E: Element> Kernel for ReductionKernel<E> {
    fn name(&self) -> &'static str {
        match self.problem.dim {
            ReductionDim::Inner => "reduction_inner",
            ReductionDim::Outer => "reduction_outer",
        }
    }

    fn range(&self) -> NdRange {
        self.range
    }

    fn local_memory_size(&self) -> usize {
        self.local_memory_size
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let input = self.input.read();
        let mut output = self.output.write();
        let problem = &self.problem;
        let operator = self.operator;
        let outputs = problem.output_len();
        let tasks = outputs * problem.batch_count;
        let range = self.range;

        match problem.dim {
            ReductionDim::Outer => {
                let items = range.global[0] as usize;
                grid.for_each_group(|group, _| {
                    for (_, id) in linear_ids(&range, group.x) {
                        for task in (id..tasks).step_by(items) {
                            let (batch, row) = (task / outputs, task % outputs);
                            let mut acc = operator.identity::<E>();
                            for col in 0..problem.cols {
                                acc = operator.accumulate(acc, input[self.input_offset(batch, row, col)]);
                            }
                            self.write(&mut output, batch, row, acc);
                        }
                    }
                    Ok(())
                })
            }
            ReductionDim::Inner => {
                let groups = range.num_groups();
                let workgroup_size = range.local[0] as usize;
                grid.for_each_group(|group, local| {
                    let partials = local.view::<E>();
                    if partials.len() < workgroup_size {
                        return Err(LaunchError::kernel(
                            "local memory can't hold one partial per work item",
                        ));
                    }

                    for task in (group.x as usize..tasks).step_by(groups) {
                        let (batch, col) = (task / outputs, task % outputs);
                        for item in 0..workgroup_size {
                            let mut acc = operator.identity::<E>();
                            for row in (item..problem.rows).step_by(workgroup_size) {
                                acc = operator.accumulate(acc, input[self.input_offset(batch, row, col)]);
                            }
                            partials[item] = acc;
                        }
                        tree_reduce(workgroup_size, |target, source| {
                            partials[target] = operator.merge(partials[target], partials[source]);
                        });
                        self.write(&mut output, batch, col, partials[0]);
                    }
                    Ok(())
                })
            }
        }
    }
}
