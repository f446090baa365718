use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, NdRange};

use super::linear_ids;
use crate::{
    Element,
    operation::{VectorKind, VectorOp},
};

/// Element-wise vector operation, work items stride over the elements.
#[derive(Debug)]
pub(crate) struct VectorKernel<E: Element> {
    kind: VectorKind<E>,
    n: usize,
    x: Buffer<E>,
    incx: usize,
    y: Option<(Buffer<E>, usize)>,
    range: NdRange,
}

impl<E: Element> VectorKernel<E> {
    pub(crate) fn new(op: &VectorOp<'_, E>, range: NdRange) -> Self {
        Self {
            kind: op.kind,
            n: op.n,
            x: op.x.buffer.clone(),
            incx: op.x.inc,
            y: op.y.map(|y| (y.buffer.clone(), y.inc)),
            range,
        }
    }

    fn for_each_element<F>(&self, grid: &mut Grid<'_>, mut func: F) -> Result<(), LaunchError>
    where
        F: FnMut(usize),
    {
        let items = self.range.global[0] as usize;
        let range = self.range;

        grid.for_each_group(|group, _| {
            for (_, id) in linear_ids(&range, group.x) {
                for i in (id..self.n).step_by(items) {
                    func(i);
                }
            }
            Ok(())
        })
    }
}

impl<E: Element> Kernel for VectorKernel<E> {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn range(&self) -> NdRange {
        self.range
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let incx = self.incx;

        if let VectorKind::Scal { alpha } = self.kind {
            let mut x = self.x.write();
            return self.for_each_element(grid, |i| x[i * incx] = alpha * x[i * incx]);
        }

        let (y, incy) = match &self.y {
            Some((y, incy)) => (y, *incy),
            None => return Err(LaunchError::kernel("the operation needs a second vector")),
        };

        match self.kind {
            VectorKind::Axpy { alpha } => {
                let x = self.x.read();
                let mut y = y.write();
                self.for_each_element(grid, |i| {
                    y[i * incy] = alpha * x[i * incx] + y[i * incy];
                })
            }
            VectorKind::Copy => {
                let x = self.x.read();
                let mut y = y.write();
                self.for_each_element(grid, |i| y[i * incy] = x[i * incx])
            }
            VectorKind::Swap => {
                let mut x = self.x.write();
                let mut y = y.write();
                self.for_each_element(grid, |i| {
                    core::mem::swap(&mut x[i * incx], &mut y[i * incy]);
                })
            }
            VectorKind::Rot { c, s } => {
                let mut x = self.x.write();
                let mut y = y.write();
                self.for_each_element(grid, |i| {
                    let (xi, yi) = (x[i * incx], y[i * incy]);
                    x[i * incx] = c * xi + s * yi;
                    y[i * incy] = c * yi - s * xi;
                })
            }
            VectorKind::Scal { .. } => Ok(()),
        }
    }
}
