use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, NdRange};

use super::{linear_ids, tree_reduce};
use crate::{
    Element,
    operation::{AssignReduction, ReduceOperator, ReductionTarget, VectorReduction},
};

/// Index of an empty candidate.
pub(crate) const NO_INDEX: u64 = u64::MAX;

/// How candidates `(value, index)` are folded.
#[derive(Clone, Copy, Debug)]
enum Fold {
    Value(ReduceOperator),
    MaxAbs,
    MinAbs,
}

impl Fold {
    fn of(kind: VectorReduction) -> Self {
        match kind {
            VectorReduction::IndexOfMaxAbs => Fold::MaxAbs,
            VectorReduction::IndexOfMinAbs => Fold::MinAbs,
            kind => Fold::Value(kind.operator()),
        }
    }

    fn identity<E: Element>(&self) -> (E, u64) {
        match self {
            Fold::Value(operator) => (operator.identity(), NO_INDEX),
            Fold::MaxAbs | Fold::MinAbs => (E::zero(), NO_INDEX),
        }
    }

    fn accumulate<E: Element>(&self, acc: (E, u64), value: E, index: u64) -> (E, u64) {
        match self {
            Fold::Value(operator) => (operator.accumulate(acc.0, value), NO_INDEX),
            Fold::MaxAbs | Fold::MinAbs => self.merge(acc, (value.abs(), index)),
        }
    }

    /// Ties keep the smallest index.
    fn merge<E: Element>(&self, lhs: (E, u64), rhs: (E, u64)) -> (E, u64) {
        let better = |lhs: E, rhs: E| match self {
            Fold::MaxAbs => rhs > lhs,
            _ => rhs < lhs,
        };

        match self {
            Fold::Value(operator) => (operator.merge(lhs.0, rhs.0), NO_INDEX),
            Fold::MaxAbs | Fold::MinAbs => {
                if rhs.1 == NO_INDEX {
                    lhs
                } else if lhs.1 == NO_INDEX
                    || better(lhs.0, rhs.0)
                    || (rhs.0 == lhs.0 && rhs.1 < lhs.1)
                {
                    rhs
                } else {
                    lhs
                }
            }
        }
    }
}

/// Bytes of local memory holding one candidate per work item.
pub(crate) fn candidate_memory<E: Element>(workgroup_size: u32) -> usize {
    let values = (workgroup_size as usize * size_of::<E>()).div_ceil(size_of::<u64>());
    (values + workgroup_size as usize) * size_of::<u64>()
}

/// First stage of a vector reduction, one candidate per workgroup.
#[derive(Debug)]
pub(crate) struct AssignReductionPartialKernel<E: Element> {
    kind: VectorReduction,
    n: usize,
    x: Buffer<E>,
    incx: usize,
    y: Option<(Buffer<E>, usize)>,
    values: Buffer<E>,
    indices: Buffer<u64>,
    range: NdRange,
    local_memory_size: usize,
}

impl<E: Element> AssignReductionPartialKernel<E> {
    pub(crate) fn new(
        reduction: &AssignReduction<'_, E>,
        values: &Buffer<E>,
        indices: &Buffer<u64>,
        range: NdRange,
        local_memory_size: usize,
    ) -> Self {
        Self {
            kind: reduction.kind,
            n: reduction.n,
            x: reduction.x.buffer.clone(),
            incx: reduction.x.inc,
            y: reduction.y.map(|y| (y.buffer.clone(), y.inc)),
            values: values.clone(),
            indices: indices.clone(),
            range,
            local_memory_size,
        }
    }
}

impl<E: Element> Kernel for AssignReductionPartialKernel<E> {
    fn name(&self) -> &'static str {
        "assign_reduction_partial"
    }

    fn range(&self) -> NdRange {
        self.range
    }

    fn local_memory_size(&self) -> usize {
        self.local_memory_size
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let x = self.x.read();
        let y = self.y.as_ref().map(|(y, inc)| (y.read(), *inc));
        let mut values = self.values.write();
        let mut indices = self.indices.write();
        let fold = Fold::of(self.kind);
        let range = self.range;
        let items = range.global[0] as usize;
        let workgroup_size = range.local[0] as usize;

        grid.for_each_group(|group, local| {
            let (local_values, local_indices) = local.split::<E, u64>(workgroup_size);
            if local_values.len() < workgroup_size || local_indices.len() < workgroup_size {
                return Err(LaunchError::kernel(
                    "local memory can't hold one candidate per work item",
                ));
            }

            for (item, id) in linear_ids(&range, group.x) {
                let mut acc = fold.identity::<E>();
                for i in (id..self.n).step_by(items) {
                    let value = match &y {
                        Some((y, incy)) => x[i * self.incx] * y[i * incy],
                        None => x[i * self.incx],
                    };
                    acc = fold.accumulate(acc, value, i as u64);
                }
                local_values[item] = acc.0;
                local_indices[item] = acc.1;
            }

            tree_reduce(workgroup_size, |target, source| {
                let merged = fold.merge(
                    (local_values[target], local_indices[target]),
                    (local_values[source], local_indices[source]),
                );
                local_values[target] = merged.0;
                local_indices[target] = merged.1;
            });

            values[group.x as usize] = local_values[0];
            indices[group.x as usize] = local_indices[0];
            Ok(())
        })
    }
}

#[derive(Debug)]
enum ScalarTarget<E: Element> {
    Value(Buffer<E>),
    Index(Buffer<u64>),
}

/// Second stage of a vector reduction, a single workgroup folding the candidates.
#[derive(Debug)]
pub(crate) struct AssignReductionFinalKernel<E: Element> {
    kind: VectorReduction,
    n: usize,
    values: Buffer<E>,
    indices: Buffer<u64>,
    target: ScalarTarget<E>,
    workgroup_size: u32,
    local_memory_size: usize,
}

impl<E: Element> AssignReductionFinalKernel<E> {
    pub(crate) fn new(
        reduction: &AssignReduction<'_, E>,
        values: &Buffer<E>,
        indices: &Buffer<u64>,
        workgroup_size: u32,
        local_memory_size: usize,
    ) -> Self {
        let target = match &reduction.target {
            ReductionTarget::Value(buffer) => ScalarTarget::Value((*buffer).clone()),
            ReductionTarget::Index(buffer) => ScalarTarget::Index((*buffer).clone()),
        };

        Self {
            kind: reduction.kind,
            n: reduction.n,
            values: values.clone(),
            indices: indices.clone(),
            target,
            workgroup_size,
            local_memory_size,
        }
    }
}

impl<E: Element> Kernel for AssignReductionFinalKernel<E> {
    fn name(&self) -> &'static str {
        "assign_reduction_final"
    }

    fn range(&self) -> NdRange {
        NdRange::groups_1d(1, self.workgroup_size)
    }

    fn local_memory_size(&self) -> usize {
        self.local_memory_size
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let values = self.values.read();
        let indices = self.indices.read();
        let fold = Fold::of(self.kind);
        let workgroup_size = self.workgroup_size as usize;
        let mut result = fold.identity::<E>();

        grid.for_each_group(|_, local| {
            let (local_values, local_indices) = local.split::<E, u64>(workgroup_size);
            if local_values.len() < workgroup_size || local_indices.len() < workgroup_size {
                return Err(LaunchError::kernel(
                    "local memory can't hold one candidate per work item",
                ));
            }

            for item in 0..workgroup_size {
                let mut acc = fold.identity::<E>();
                for partial in (item..values.len()).step_by(workgroup_size) {
                    acc = fold.merge(acc, (values[partial], indices[partial]));
                }
                local_values[item] = acc.0;
                local_indices[item] = acc.1;
            }

            tree_reduce(workgroup_size, |target, source| {
                let merged = fold.merge(
                    (local_values[target], local_indices[target]),
                    (local_values[source], local_indices[source]),
                );
                local_values[target] = merged.0;
                local_indices[target] = merged.1;
            });

            result = (local_values[0], local_indices[0]);
            Ok(())
        })?;

        match &self.target {
            ScalarTarget::Value(buffer) => {
                let value = match fold {
                    Fold::Value(operator) => operator.finalize(result.0, self.n),
                    Fold::MaxAbs | Fold::MinAbs => result.0,
                };
                buffer.write()[0] = match self.kind {
                    VectorReduction::Norm2 => value.sqrt(),
                    _ => value,
                };
            }
            ScalarTarget::Index(buffer) => buffer.write()[0] = result.1,
        }

        Ok(())
    }
}
