mod gemm;
mod gemv;
mod reduction;
mod vector;

pub use gemm::*;
pub use gemv::*;
pub use reduction::*;
pub use vector::*;

use tessel_runtime::Buffer;

use crate::{ConfigError, Element};

/// How an operand is used, BLAS convention.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Transpose {
    /// `op(A) = A`.
    #[default]
    Normal,
    /// `op(A) = Aᵀ`.
    Transposed,
    /// `op(A) = Aᴴ`, identical to [Transposed](Transpose::Transposed) for real elements.
    Conjugate,
}

impl Transpose {
    /// Parse a BLAS transpose character, `n`, `t` or `c` in either case.
    pub fn from_char(value: char) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase() {
            'n' => Ok(Self::Normal),
            't' => Ok(Self::Transposed),
            'c' => Ok(Self::Conjugate),
            _ => Err(ConfigError::InvalidTranspose { value }),
        }
    }

    /// Whether rows and columns are swapped.
    pub fn is_transposed(&self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Stored `(rows, cols)` of an operand whose `op()` is `rows × cols`.
    pub fn stored_shape(&self, rows: usize, cols: usize) -> (usize, usize) {
        match self.is_transposed() {
            true => (cols, rows),
            false => (rows, cols),
        }
    }
}

impl TryFrom<char> for Transpose {
    type Error = ConfigError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::from_char(value)
    }
}

/// One scheduled computation, consumed by [execute](crate::ExecutionContext::execute).
#[derive(Debug)]
pub enum Operation<'a, E: Element> {
    /// `C := alpha * op(A) * op(B) + beta * C`, possibly batched.
    Gemm(Gemm<'a, E>),
    /// Raw partial products over slices of the depth.
    GemmPartial(GemmPartial<'a, E>),
    /// Matrix to vector reduction.
    Reduction(Reduction<'a, E>),
    /// Vector to scalar reduction.
    AssignReduction(AssignReduction<'a, E>),
    /// Dense matrix-vector product.
    Gemv(Gemv<'a, E>),
    /// Banded matrix-vector product.
    Gbmv(Gbmv<'a, E>),
    /// Element-wise vector operation.
    Vector(VectorOp<'a, E>),
}

impl<E: Element> Operation<'_, E> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Gemm(_) => "gemm",
            Operation::GemmPartial(_) => "gemm_partial",
            Operation::Reduction(_) => "reduction",
            Operation::AssignReduction(_) => "assign_reduction",
            Operation::Gemv(_) => "gemv",
            Operation::Gbmv(_) => "gbmv",
            Operation::Vector(op) => op.kind().name(),
        }
    }
}

macro_rules! impl_from_descriptor {
    ($($variant:ident),*) => {
        $(
            impl<'a, E: Element> From<$variant<'a, E>> for Operation<'a, E> {
                fn from(value: $variant<'a, E>) -> Self {
                    Operation::$variant(value)
                }
            }
        )*
    };
}

impl_from_descriptor!(Gemm, GemmPartial, Reduction, AssignReduction, Gemv, Gbmv);

impl<'a, E: Element> From<VectorOp<'a, E>> for Operation<'a, E> {
    fn from(value: VectorOp<'a, E>) -> Self {
        Operation::Vector(value)
    }
}

/// A vector stored every `inc` elements of a buffer.
#[derive(Debug, new)]
pub struct StridedVector<'a, E: Element> {
    /// The storage.
    pub buffer: &'a Buffer<E>,
    /// Distance between two consecutive elements.
    pub inc: usize,
}

impl<E: Element> Clone for StridedVector<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Element> Copy for StridedVector<'_, E> {}

impl<'a, E: Element> StridedVector<'a, E> {
    /// A vector using every element of the buffer.
    pub fn contiguous(buffer: &'a Buffer<E>) -> Self {
        Self::new(buffer, 1)
    }

    /// Elements the buffer needs to hold a vector of `len` elements.
    pub fn required_len(&self, len: usize) -> usize {
        match len {
            0 => 0,
            len => (len - 1) * self.inc + 1,
        }
    }

    pub(crate) fn check(&self, operand: &'static str, len: usize) -> Result<(), ConfigError> {
        if self.inc == 0 {
            return Err(ConfigError::invalid_argument(
                operand,
                "the increment must be positive",
            ));
        }
        check_len(operand, self.buffer, self.required_len(len))
    }
}

pub(crate) fn check_len<T: bytemuck::Pod>(
    operand: &'static str,
    buffer: &Buffer<T>,
    required: usize,
) -> Result<(), ConfigError> {
    if buffer.len() < required {
        return Err(ConfigError::OperandTooSmall {
            operand,
            required,
            actual: buffer.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_alias<A: bytemuck::Pod, B: bytemuck::Pod>(
    (first, a): (&'static str, &Buffer<A>),
    (second, b): (&'static str, &Buffer<B>),
) -> Result<(), ConfigError> {
    if a.same_storage(b) {
        return Err(ConfigError::AliasedOperands { first, second });
    }
    Ok(())
}
