use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, NdRange};

use super::linear_ids;
use crate::{
    Element,
    operation::{Gbmv, GbmvProblem},
};

/// Banded matrix-vector product, one output per work item.
#[derive(Debug)]
pub(crate) struct GbmvKernel<E: Element> {
    problem: GbmvProblem,
    alpha: E,
    beta: E,
    a: Buffer<E>,
    x: Buffer<E>,
    incx: usize,
    y: Buffer<E>,
    incy: usize,
    range: NdRange,
}

impl<E: Element> GbmvKernel<E> {
    pub(crate) fn new(gbmv: &Gbmv<'_, E>, range: NdRange) -> Self {
        Self {
            problem: gbmv.problem,
            alpha: gbmv.alpha,
            beta: gbmv.beta,
            a: gbmv.a.clone(),
            x: gbmv.x.buffer.clone(),
            incx: gbmv.x.inc,
            y: gbmv.y.buffer.clone(),
            incy: gbmv.y.inc,
            range,
        }
    }

    /// `A(i, j)` inside the band.
    #[inline]
    fn band(&self, a: &[E], i: usize, j: usize) -> E {
        a[self.problem.ku + i - j + j * self.problem.lda]
    }

    fn output(&self, a: &[E], x: &[E], out: usize) -> E {
        let GbmvProblem { m, n, kl, ku, .. } = self.problem;
        let mut sum = E::zero();

        match self.problem.trans.is_transposed() {
            // y(j) = Σ_i A(i, j) x(i), i in [j - ku, j + kl].
            true => {
                for i in out.saturating_sub(ku)..(out + kl + 1).min(m) {
                    sum = sum + self.band(a, i, out) * x[i * self.incx];
                }
            }
            // y(i) = Σ_j A(i, j) x(j), j in [i - kl, i + ku].
            false => {
                for j in out.saturating_sub(kl)..(out + ku + 1).min(n) {
                    sum = sum + self.band(a, out, j) * x[j * self.incx];
                }
            }
        }

        sum
    }
}

impl<E: Element> Kernel for GbmvKernel<E> {
    fn name(&self) -> &'static str {
        "gbmv"
    }

    fn range(&self) -> NdRange {
        self.range
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let a = self.a.read();
        let x = self.x.read();
        let mut y = self.y.write();
        let outputs = self.problem.y_len();
        let items = self.range.global[0] as usize;
        let range = self.range;

        grid.for_each_group(|group, _| {
            for (_, id) in linear_ids(&range, group.x) {
                for out in (id..outputs).step_by(items) {
                    let value = self.alpha * self.output(&a, &x, out);
                    let offset = out * self.incy;
                    y[offset] = match self.beta == E::zero() {
                        true => value,
                        false => value + self.beta * y[offset],
                    };
                }
            }
            Ok(())
        })
    }
}
