use tessel_runtime::Buffer;

use super::{StridedVector, Transpose, check_alias, check_len};
use crate::{
    ConfigError, Element,
    config::{GbmvConfig, GemvConfig},
};

/// Shape of a dense matrix-vector product, A is a column-major `m × n` matrix.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GemvProblem {
    /// How A is used.
    pub trans: Transpose,
    /// Rows of A.
    pub m: usize,
    /// Columns of A.
    pub n: usize,
    /// Leading dimension of A.
    pub lda: usize,
}

impl GemvProblem {
    /// A product with a packed matrix.
    pub fn new(trans: Transpose, m: usize, n: usize) -> Self {
        Self {
            trans,
            m,
            n,
            lda: m.max(1),
        }
    }

    /// Same product with an explicit leading dimension.
    pub fn with_leading_dim(mut self, lda: usize) -> Self {
        self.lda = lda;
        self
    }

    /// Elements of `x`.
    pub fn x_len(&self) -> usize {
        match self.trans.is_transposed() {
            true => self.m,
            false => self.n,
        }
    }

    /// Elements of `y`.
    pub fn y_len(&self) -> usize {
        match self.trans.is_transposed() {
            true => self.n,
            false => self.m,
        }
    }

    /// Whether the product writes nothing.
    pub fn is_empty(&self) -> bool {
        self.m == 0 || self.n == 0
    }
}

fn check_vectors<E: Element>(
    a: &Buffer<E>,
    x: &StridedVector<'_, E>,
    y: &StridedVector<'_, E>,
    x_len: usize,
    y_len: usize,
) -> Result<(), ConfigError> {
    x.check("x", x_len)?;
    y.check("y", y_len)?;
    check_alias(("a", a), ("y", y.buffer))?;
    check_alias(("x", x.buffer), ("y", y.buffer))
}

/// `y := alpha * op(A) * x + beta * y` with a fixed launch configuration.
#[derive(Debug)]
pub struct Gemv<'a, E: Element> {
    pub(crate) config: GemvConfig,
    pub(crate) problem: GemvProblem,
    pub(crate) alpha: E,
    pub(crate) beta: E,
    pub(crate) a: &'a Buffer<E>,
    pub(crate) x: StridedVector<'a, E>,
    pub(crate) y: StridedVector<'a, E>,
}

impl<'a, E: Element> Gemv<'a, E> {
    /// Describe a product, checking the operands fit the problem.
    pub fn new(
        config: GemvConfig,
        problem: GemvProblem,
        alpha: E,
        a: &'a Buffer<E>,
        x: StridedVector<'a, E>,
        beta: E,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        if problem.lda < problem.m.max(1) {
            return Err(ConfigError::invalid_argument(
                "lda",
                format!("{} is smaller than the {} rows", problem.lda, problem.m),
            ));
        }

        let required = match problem.is_empty() {
            true => 0,
            false => problem.lda * (problem.n - 1) + problem.m,
        };
        check_len("a", a, required)?;
        check_vectors(a, &x, &y, problem.x_len(), problem.y_len())?;

        Ok(Self {
            config,
            problem,
            alpha,
            beta,
            a,
            x,
            y,
        })
    }

    /// The launch configuration.
    pub fn config(&self) -> &GemvConfig {
        &self.config
    }

    /// The problem.
    pub fn problem(&self) -> &GemvProblem {
        &self.problem
    }
}

/// Shape of a banded matrix-vector product.
///
/// A is `m × n` with `kl` sub-diagonals and `ku` super-diagonals, stored in BLAS band format:
/// `A(i, j)` is at `(ku + i - j) + j * lda`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GbmvProblem {
    /// How A is used.
    pub trans: Transpose,
    /// Rows of A.
    pub m: usize,
    /// Columns of A.
    pub n: usize,
    /// Sub-diagonals.
    pub kl: usize,
    /// Super-diagonals.
    pub ku: usize,
    /// Leading dimension of the band storage.
    pub lda: usize,
}

impl GbmvProblem {
    /// A product with packed band storage.
    pub fn new(trans: Transpose, m: usize, n: usize, kl: usize, ku: usize) -> Self {
        Self {
            trans,
            m,
            n,
            kl,
            ku,
            lda: kl + ku + 1,
        }
    }

    /// Same product with an explicit leading dimension.
    pub fn with_leading_dim(mut self, lda: usize) -> Self {
        self.lda = lda;
        self
    }

    /// Elements of `x`.
    pub fn x_len(&self) -> usize {
        match self.trans.is_transposed() {
            true => self.m,
            false => self.n,
        }
    }

    /// Elements of `y`.
    pub fn y_len(&self) -> usize {
        match self.trans.is_transposed() {
            true => self.n,
            false => self.m,
        }
    }

    /// Whether the product writes nothing.
    pub fn is_empty(&self) -> bool {
        self.m == 0 || self.n == 0
    }
}

/// `y := alpha * op(A) * x + beta * y` for a banded A.
#[derive(Debug)]
pub struct Gbmv<'a, E: Element> {
    pub(crate) config: GbmvConfig,
    pub(crate) problem: GbmvProblem,
    pub(crate) alpha: E,
    pub(crate) beta: E,
    pub(crate) a: &'a Buffer<E>,
    pub(crate) x: StridedVector<'a, E>,
    pub(crate) y: StridedVector<'a, E>,
}

impl<'a, E: Element> Gbmv<'a, E> {
    /// Describe a banded product, checking the operands fit the problem.
    pub fn new(
        config: GbmvConfig,
        problem: GbmvProblem,
        alpha: E,
        a: &'a Buffer<E>,
        x: StridedVector<'a, E>,
        beta: E,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        let band = problem.kl + problem.ku + 1;
        if problem.lda < band {
            return Err(ConfigError::invalid_argument(
                "lda",
                format!("{} can't hold the {band} diagonals", problem.lda),
            ));
        }

        let required = match problem.is_empty() {
            true => 0,
            false => problem.lda * (problem.n - 1) + band,
        };
        check_len("a", a, required)?;
        check_vectors(a, &x, &y, problem.x_len(), problem.y_len())?;

        Ok(Self {
            config,
            problem,
            alpha,
            beta,
            a,
            x,
            y,
        })
    }

    /// The problem.
    pub fn problem(&self) -> &GbmvProblem {
        &self.problem
    }
}
