use super::{StridedVector, check_alias};
use crate::{ConfigError, Element};

/// Element-wise vector operations, BLAS level 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VectorKind<E: Element> {
    /// `y := alpha * x + y`.
    Axpy {
        /// Scale of `x`.
        alpha: E,
    },
    /// `x := alpha * x`.
    Scal {
        /// Scale.
        alpha: E,
    },
    /// `y := x`.
    Copy,
    /// `x, y := y, x`.
    Swap,
    /// Plane rotation, `x, y := c * x + s * y, c * y - s * x`.
    Rot {
        /// Cosine.
        c: E,
        /// Sine.
        s: E,
    },
}

impl<E: Element> VectorKind<E> {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            VectorKind::Axpy { .. } => "axpy",
            VectorKind::Scal { .. } => "scal",
            VectorKind::Copy => "copy",
            VectorKind::Swap => "swap",
            VectorKind::Rot { .. } => "rot",
        }
    }
}

/// One element-wise operation over `n` elements of one or two vectors.
#[derive(Debug)]
pub struct VectorOp<'a, E: Element> {
    pub(crate) kind: VectorKind<E>,
    pub(crate) n: usize,
    pub(crate) x: StridedVector<'a, E>,
    pub(crate) y: Option<StridedVector<'a, E>>,
}

impl<'a, E: Element> VectorOp<'a, E> {
    /// `y := alpha * x + y`.
    pub fn axpy(
        n: usize,
        alpha: E,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        Self::binary(VectorKind::Axpy { alpha }, n, x, y)
    }

    /// `x := alpha * x`.
    pub fn scal(n: usize, alpha: E, x: StridedVector<'a, E>) -> Result<Self, ConfigError> {
        x.check("x", n)?;

        Ok(Self {
            kind: VectorKind::Scal { alpha },
            n,
            x,
            y: None,
        })
    }

    /// `y := x`.
    pub fn copy(
        n: usize,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        Self::binary(VectorKind::Copy, n, x, y)
    }

    /// Exchange `x` and `y`.
    pub fn swap(
        n: usize,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        Self::binary(VectorKind::Swap, n, x, y)
    }

    /// Apply the plane rotation `(c, s)` to every pair `(x, y)`.
    pub fn rot(
        n: usize,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
        c: E,
        s: E,
    ) -> Result<Self, ConfigError> {
        Self::binary(VectorKind::Rot { c, s }, n, x, y)
    }

    fn binary(
        kind: VectorKind<E>,
        n: usize,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
    ) -> Result<Self, ConfigError> {
        x.check("x", n)?;
        y.check("y", n)?;
        check_alias(("x", x.buffer), ("y", y.buffer))?;

        Ok(Self {
            kind,
            n,
            x,
            y: Some(y),
        })
    }

    /// The operation.
    pub fn kind(&self) -> VectorKind<E> {
        self.kind
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether no element is touched.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}
