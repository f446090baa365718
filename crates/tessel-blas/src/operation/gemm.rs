use tessel_runtime::Buffer;

use super::{Transpose, check_alias, check_len};
use crate::{
    ConfigError, Element,
    config::{BatchLayout, GemmAlgorithm, GemmConfig},
};

/// Shape and memory layout of a (batched) matrix multiplication.
///
/// Matrices are column-major. `op(A)` is `m × k`, `op(B)` is `k × n` and `C` is `m × n`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GemmProblem {
    /// How A is used.
    pub trans_a: Transpose,
    /// How B is used.
    pub trans_b: Transpose,
    /// Rows of `op(A)` and C.
    pub m: usize,
    /// Columns of `op(B)` and C.
    pub n: usize,
    /// Depth of the product.
    pub k: usize,
    /// Leading dimension of A.
    pub lda: usize,
    /// Leading dimension of B.
    pub ldb: usize,
    /// Leading dimension of C.
    pub ldc: usize,
    /// Number of matrices in the batch.
    pub batch_size: usize,
    /// Memory arrangement of the batch.
    pub batch_layout: BatchLayout,
    /// Distance between two matrices of A in a strided batch.
    pub stride_a: usize,
    /// Distance between two matrices of B in a strided batch.
    pub stride_b: usize,
    /// Distance between two matrices of C in a strided batch.
    pub stride_c: usize,
}

impl GemmProblem {
    /// A single multiplication with packed operands.
    pub fn new(trans_a: Transpose, trans_b: Transpose, m: usize, n: usize, k: usize) -> Self {
        let (rows_a, cols_a) = trans_a.stored_shape(m, k);
        let (rows_b, cols_b) = trans_b.stored_shape(k, n);
        let lda = rows_a.max(1);
        let ldb = rows_b.max(1);
        let ldc = m.max(1);

        Self {
            trans_a,
            trans_b,
            m,
            n,
            k,
            lda,
            ldb,
            ldc,
            batch_size: 1,
            batch_layout: BatchLayout::Strided,
            stride_a: lda * cols_a,
            stride_b: ldb * cols_b,
            stride_c: ldc * n,
        }
    }

    /// Same problem with explicit leading dimensions, batch strides are packed again.
    pub fn with_leading_dims(mut self, lda: usize, ldb: usize, ldc: usize) -> Self {
        self.lda = lda;
        self.ldb = ldb;
        self.ldc = ldc;
        self.stride_a = lda * self.stored_a().1;
        self.stride_b = ldb * self.stored_b().1;
        self.stride_c = ldc * self.n;
        self
    }

    /// Same problem over a batch of matrices.
    pub fn with_batch(mut self, batch_size: usize, batch_layout: BatchLayout) -> Self {
        self.batch_size = batch_size;
        self.batch_layout = batch_layout;
        self
    }

    /// Same problem with explicit strides between the matrices of a strided batch.
    pub fn with_batch_strides(mut self, stride_a: usize, stride_b: usize, stride_c: usize) -> Self {
        self.stride_a = stride_a;
        self.stride_b = stride_b;
        self.stride_c = stride_c;
        self
    }

    /// Stored `(rows, cols)` of A.
    pub fn stored_a(&self) -> (usize, usize) {
        self.trans_a.stored_shape(self.m, self.k)
    }

    /// Stored `(rows, cols)` of B.
    pub fn stored_b(&self) -> (usize, usize) {
        self.trans_b.stored_shape(self.k, self.n)
    }

    /// Whether the multiplication writes nothing.
    pub fn is_empty(&self) -> bool {
        self.m == 0 || self.n == 0 || self.batch_size == 0
    }

    /// Elements a buffer needs to hold one operand of every matrix in the batch.
    pub fn required_len(&self, (rows, cols): (usize, usize), ld: usize, stride: usize) -> usize {
        if rows == 0 || cols == 0 || self.batch_size == 0 {
            return 0;
        }

        let matrix = ld * (cols - 1) + rows;
        match self.batch_layout {
            BatchLayout::Strided => stride * (self.batch_size - 1) + matrix,
            BatchLayout::Interleaved => self.batch_size * matrix,
        }
    }

    /// Check the dimensions are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("lda", self.lda, self.stored_a().0),
            ("ldb", self.ldb, self.stored_b().0),
            ("ldc", self.ldc, self.m),
        ];
        for (name, ld, rows) in checks {
            if ld < rows.max(1) {
                return Err(ConfigError::invalid_argument(
                    name,
                    format!("{ld} is smaller than the {rows} stored rows"),
                ));
            }
        }

        if self.batch_size == 0 {
            return Err(ConfigError::invalid_argument(
                "batch_size",
                "a batch holds at least one matrix",
            ));
        }

        if self.batch_layout == BatchLayout::Strided
            && self.batch_size > 1
            && self.stride_c < self.ldc * self.n
        {
            return Err(ConfigError::invalid_argument(
                "stride_c",
                format!(
                    "{} makes the output matrices overlap, at least {} is needed",
                    self.stride_c,
                    self.ldc * self.n
                ),
            ));
        }

        Ok(())
    }

    fn check_operands<E: Element>(
        &self,
        a: &Buffer<E>,
        b: &Buffer<E>,
    ) -> Result<(), ConfigError> {
        check_len(
            "a",
            a,
            self.required_len(self.stored_a(), self.lda, self.stride_a),
        )?;
        check_len(
            "b",
            b,
            self.required_len(self.stored_b(), self.ldb, self.stride_b),
        )
    }
}

/// `C := alpha * op(A) * op(B) + beta * C` with a fixed launch configuration.
#[derive(Debug)]
pub struct Gemm<'a, E: Element> {
    pub(crate) config: GemmConfig,
    pub(crate) problem: GemmProblem,
    pub(crate) alpha: E,
    pub(crate) beta: E,
    pub(crate) a: &'a Buffer<E>,
    pub(crate) b: &'a Buffer<E>,
    pub(crate) c: &'a Buffer<E>,
}

impl<'a, E: Element> Gemm<'a, E> {
    /// Describe a multiplication, checking the operands fit the problem.
    ///
    /// `c` can't share storage with `a` or `b`.
    pub fn new(
        config: GemmConfig,
        problem: GemmProblem,
        alpha: E,
        a: &'a Buffer<E>,
        b: &'a Buffer<E>,
        beta: E,
        c: &'a Buffer<E>,
    ) -> Result<Self, ConfigError> {
        problem.validate()?;

        if config.batch_layout != problem.batch_layout {
            return Err(ConfigError::invalid_argument(
                "batch_layout",
                format!(
                    "the problem is {:?} but the configuration was built for {:?}",
                    problem.batch_layout, config.batch_layout
                ),
            ));
        }

        problem.check_operands(a, b)?;
        check_len(
            "c",
            c,
            problem.required_len((problem.m, problem.n), problem.ldc, problem.stride_c),
        )?;
        check_alias(("a", a), ("c", c))?;
        check_alias(("b", b), ("c", c))?;

        Ok(Self {
            config,
            problem,
            alpha,
            beta,
            a,
            b,
            c,
        })
    }

    /// The launch configuration.
    pub fn config(&self) -> &GemmConfig {
        &self.config
    }

    /// The problem.
    pub fn problem(&self) -> &GemmProblem {
        &self.problem
    }

    /// Whether the prior content of C is ignored.
    pub fn beta_zero(&self) -> bool {
        self.beta == E::zero()
    }

    /// Whether the depth is split across partial products.
    pub fn is_tall_skinny(&self) -> bool {
        self.config.algorithm == GemmAlgorithm::TallSkinny
    }
}

/// Raw partial products of a multiplication, the first stage of a tall-skinny GEMM.
///
/// The depth is split in `num_partials` contiguous slices. The product over slice `p` of batch
/// `b` is written column-major (`m` rows) at offset `(p + b * num_partials) * m * n` of
/// `scratch`, without any scaling.
#[derive(Debug)]
pub struct GemmPartial<'a, E: Element> {
    pub(crate) config: GemmConfig,
    pub(crate) problem: GemmProblem,
    pub(crate) a: &'a Buffer<E>,
    pub(crate) b: &'a Buffer<E>,
    pub(crate) scratch: &'a Buffer<E>,
    pub(crate) num_partials: usize,
}

impl<'a, E: Element> GemmPartial<'a, E> {
    /// Describe the partial products, checking `scratch` holds every one of them.
    pub fn new(
        config: GemmConfig,
        problem: GemmProblem,
        a: &'a Buffer<E>,
        b: &'a Buffer<E>,
        scratch: &'a Buffer<E>,
        num_partials: usize,
    ) -> Result<Self, ConfigError> {
        problem.validate()?;

        if problem.batch_layout != BatchLayout::Strided {
            return Err(ConfigError::invalid_argument(
                "batch_layout",
                "partial products only support strided batches",
            ));
        }

        if num_partials == 0 {
            return Err(ConfigError::invalid_argument(
                "num_partials",
                "the depth is split in at least one slice",
            ));
        }

        problem.check_operands(a, b)?;
        check_len(
            "scratch",
            scratch,
            Self::scratch_len(&problem, num_partials),
        )?;
        check_alias(("a", a), ("scratch", scratch))?;
        check_alias(("b", b), ("scratch", scratch))?;

        Ok(Self {
            config,
            problem,
            a,
            b,
            scratch,
            num_partials,
        })
    }

    /// Elements of scratch needed by the partial products of a problem.
    pub fn scratch_len(problem: &GemmProblem, num_partials: usize) -> usize {
        num_partials * problem.batch_size * problem.m * problem.n
    }

    /// Number of depth slices.
    pub fn num_partials(&self) -> usize {
        self.num_partials
    }

    /// The problem.
    pub fn problem(&self) -> &GemmProblem {
        &self.problem
    }
}
