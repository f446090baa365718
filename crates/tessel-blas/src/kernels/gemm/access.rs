use crate::{
    config::BatchLayout,
    operation::{GemmProblem, Transpose},
};

/// Maps `op(X)` coordinates of one batch member to a buffer offset.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MatrixAccess {
    ld: usize,
    stride: usize,
    batch_count: usize,
    transposed: bool,
    layout: BatchLayout,
}

impl MatrixAccess {
    fn new(ld: usize, stride: usize, trans: Transpose, problem: &GemmProblem) -> Self {
        Self {
            ld,
            stride,
            batch_count: problem.batch_size,
            transposed: trans.is_transposed(),
            layout: problem.batch_layout,
        }
    }

    pub(crate) fn lhs(problem: &GemmProblem) -> Self {
        Self::new(problem.lda, problem.stride_a, problem.trans_a, problem)
    }

    pub(crate) fn rhs(problem: &GemmProblem) -> Self {
        Self::new(problem.ldb, problem.stride_b, problem.trans_b, problem)
    }

    pub(crate) fn output(problem: &GemmProblem) -> Self {
        Self::new(problem.ldc, problem.stride_c, Transpose::Normal, problem)
    }

    /// Whether consecutive rows of `op(X)` are consecutive in memory.
    pub(crate) fn rows_contiguous(&self) -> bool {
        !self.transposed && self.layout == BatchLayout::Strided
    }

    /// Whether consecutive columns of `op(X)` are consecutive in memory.
    pub(crate) fn cols_contiguous(&self) -> bool {
        self.transposed && self.layout == BatchLayout::Strided
    }

    #[inline]
    pub(crate) fn offset(&self, batch: usize, row: usize, col: usize) -> usize {
        let (row, col) = match self.transposed {
            true => (col, row),
            false => (row, col),
        };
        let element = row + col * self.ld;

        match self.layout {
            BatchLayout::Strided => batch * self.stride + element,
            BatchLayout::Interleaved => element * self.batch_count + batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposed_strided_offsets() {
        let problem = GemmProblem::new(Transpose::Transposed, Transpose::Normal, 3, 2, 4)
            .with_batch(2, BatchLayout::Strided);
        let lhs = MatrixAccess::lhs(&problem);

        // A is stored 4 × 3, op(A)(2, 1) is A(1, 2).
        assert_eq!(lhs.offset(0, 2, 1), 1 + 2 * 4);
        assert_eq!(lhs.offset(1, 2, 1), 12 + 1 + 2 * 4);
        assert!(lhs.cols_contiguous());
    }

    #[test]
    fn interleaved_offsets() {
        let problem = GemmProblem::new(Transpose::Normal, Transpose::Normal, 3, 2, 4)
            .with_batch(5, BatchLayout::Interleaved);
        let out = MatrixAccess::output(&problem);

        assert_eq!(out.offset(4, 1, 1), (1 + 3) * 5 + 4);
        assert!(!out.rows_contiguous());
    }
}
