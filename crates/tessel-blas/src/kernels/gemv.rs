use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, NdRange};

use super::tree_reduce;
use crate::{
    Element,
    config::{GemvConfig, GemvMemory},
    operation::{Gemv, GemvProblem},
};

/// Dense matrix-vector product.
///
/// With local memory, a workgroup owns `rows` outputs and its work items split the reduced
/// dimension: each one accumulates a partial sum per output against a chunk of `x` cached in
/// local memory, then the partial sums are folded by a tree. Without local memory each work item
/// owns one output.
#[derive(Debug)]
pub(crate) struct GemvKernel<E: Element> {
    config: GemvConfig,
    problem: GemvProblem,
    alpha: E,
    beta: E,
    a: Buffer<E>,
    x: Buffer<E>,
    incx: usize,
    y: Buffer<E>,
    incy: usize,
}

impl<E: Element> GemvKernel<E> {
    pub(crate) fn new(gemv: &Gemv<'_, E>) -> Self {
        Self {
            config: gemv.config,
            problem: gemv.problem,
            alpha: gemv.alpha,
            beta: gemv.beta,
            a: gemv.a.clone(),
            x: gemv.x.buffer.clone(),
            incx: gemv.x.inc,
            y: gemv.y.buffer.clone(),
            incy: gemv.y.inc,
        }
    }

    /// `op(A)(out, red)`.
    #[inline]
    fn element(&self, a: &[E], out: usize, red: usize) -> E {
        match self.problem.trans.is_transposed() {
            true => a[red + out * self.problem.lda],
            false => a[out + red * self.problem.lda],
        }
    }

    fn store(&self, y: &mut [E], out: usize, sum: E) {
        let offset = out * self.incy;
        let value = self.alpha * sum;

        y[offset] = match self.beta == E::zero() {
            true => value,
            false => value + self.beta * y[offset],
        };
    }
}

impl<E: Element> Kernel for GemvKernel<E> {
    fn name(&self) -> &'static str {
        match self.config.memory {
            GemvMemory::Local => "gemv_local",
            GemvMemory::NoLocal => "gemv_no_local",
        }
    }

    fn range(&self) -> NdRange {
        let outputs = self.problem.y_len();
        let groups = match self.config.memory {
            GemvMemory::Local => outputs.div_ceil(self.config.rows as usize),
            GemvMemory::NoLocal => outputs.div_ceil(self.config.workgroup_size as usize),
        };
        NdRange::groups_1d(groups as u32, self.config.workgroup_size)
    }

    fn local_memory_size(&self) -> usize {
        self.config.local_memory_size::<E>()
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let a = self.a.read();
        let x = self.x.read();
        let mut y = self.y.write();
        let outputs = self.problem.y_len();
        let reduced = self.problem.x_len();
        let workgroup_size = self.config.workgroup_size as usize;
        let rows = self.config.rows as usize;

        if self.config.memory == GemvMemory::NoLocal {
            return grid.for_each_group(|group, _| {
                for item in 0..workgroup_size {
                    let out = group.x as usize * workgroup_size + item;
                    if out >= outputs {
                        break;
                    }
                    let mut sum = E::zero();
                    for red in 0..reduced {
                        sum = sum + self.element(&a, out, red) * x[red * self.incx];
                    }
                    self.store(&mut y, out, sum);
                }
                Ok(())
            });
        }

        grid.for_each_group(|group, local| {
            let (partials, cached_x) = local.view::<E>().split_at_mut(rows * workgroup_size);
            let first = group.x as usize * rows;
            let count = rows.min(outputs - first);

            for chunk in (0..reduced).step_by(workgroup_size) {
                for item in 0..workgroup_size {
                    let red = chunk + item;
                    cached_x[item] = match red < reduced {
                        true => x[red * self.incx],
                        false => E::zero(),
                    };
                }

                for item in 0..workgroup_size.min(reduced - chunk) {
                    for row in 0..count {
                        let value = self.element(&a, first + row, chunk + item) * cached_x[item];
                        let slot = row * workgroup_size + item;
                        partials[slot] = partials[slot] + value;
                    }
                }
            }

            for row in 0..count {
                let slots = &mut partials[row * workgroup_size..(row + 1) * workgroup_size];
                tree_reduce(workgroup_size, |target, source| {
                    slots[target] = slots[target] + slots[source];
                });
                self.store(&mut y, first + row, slots[0]);
            }
            Ok(())
        })
    }
}
