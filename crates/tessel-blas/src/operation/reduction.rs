use tessel_runtime::Buffer;

use super::{StridedVector, check_alias, check_len};
use crate::{ConfigError, Element};

/// Binary operator folding a sequence into one value.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ReduceOperator {
    /// Sum.
    Add,
    /// Product.
    Product,
    /// Maximum.
    Max,
    /// Minimum.
    Min,
    /// Arithmetic mean.
    Mean,
    /// Sum of absolute values.
    AbsoluteAdd,
    /// Sum of squares.
    SquareAdd,
}

impl ReduceOperator {
    /// Value of an empty accumulator.
    pub fn identity<E: Element>(&self) -> E {
        match self {
            ReduceOperator::Product => E::one(),
            ReduceOperator::Max => E::neg_infinity(),
            ReduceOperator::Min => E::infinity(),
            _ => E::zero(),
        }
    }

    /// Fold one input element into an accumulator.
    pub fn accumulate<E: Element>(&self, acc: E, value: E) -> E {
        match self {
            ReduceOperator::AbsoluteAdd => acc + value.abs(),
            ReduceOperator::SquareAdd => acc + value * value,
            _ => self.merge(acc, value),
        }
    }

    /// Combine two accumulators.
    pub fn merge<E: Element>(&self, lhs: E, rhs: E) -> E {
        match self {
            ReduceOperator::Product => lhs * rhs,
            ReduceOperator::Max => lhs.max(rhs),
            ReduceOperator::Min => lhs.min(rhs),
            ReduceOperator::Add
            | ReduceOperator::Mean
            | ReduceOperator::AbsoluteAdd
            | ReduceOperator::SquareAdd => lhs + rhs,
        }
    }

    /// Turn an accumulator over `count` elements into the result.
    pub fn finalize<E: Element>(&self, acc: E, count: usize) -> E {
        match self {
            ReduceOperator::Mean if count > 0 => acc / E::from_double(count as f64),
            _ => acc,
        }
    }
}

/// Which dimension of a matrix is folded.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ReductionDim {
    /// Fold the rows of each column, one result per column.
    Inner,
    /// Fold the columns of each row, one result per row.
    Outer,
}

/// Shape of a matrix to vector reduction.
///
/// The input is a column-major `rows × cols` matrix. Result `r` is written at
/// `(r % output_rows) + (r / output_rows) * output_ld` of the output, so the result vector can be
/// laid out as a matrix.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ReductionProblem {
    /// Rows of the input.
    pub rows: usize,
    /// Columns of the input.
    pub cols: usize,
    /// Leading dimension of the input.
    pub ld: usize,
    /// Folded dimension.
    pub dim: ReductionDim,
    /// Rows of the output layout.
    pub output_rows: usize,
    /// Leading dimension of the output layout.
    pub output_ld: usize,
    /// Number of independent reductions.
    pub batch_count: usize,
    /// Distance between two inputs of the batch.
    pub input_stride: usize,
    /// Distance between two outputs of the batch.
    pub output_stride: usize,
}

impl ReductionProblem {
    /// A packed reduction with a packed output vector.
    pub fn new(rows: usize, cols: usize, dim: ReductionDim) -> Self {
        let output_len = match dim {
            ReductionDim::Inner => cols,
            ReductionDim::Outer => rows,
        };

        Self {
            rows,
            cols,
            ld: rows.max(1),
            dim,
            output_rows: output_len.max(1),
            output_ld: output_len.max(1),
            batch_count: 1,
            input_stride: rows * cols,
            output_stride: output_len,
        }
    }

    /// Same reduction with an explicit input leading dimension.
    pub fn with_leading_dim(mut self, ld: usize) -> Self {
        self.ld = ld;
        self.input_stride = ld * self.cols;
        self
    }

    /// Same reduction writing its results as a matrix of `output_rows` rows.
    pub fn with_output_layout(mut self, output_rows: usize, output_ld: usize) -> Self {
        self.output_rows = output_rows;
        self.output_ld = output_ld;
        self
    }

    /// Same reduction repeated over a batch.
    pub fn with_batch(
        mut self,
        batch_count: usize,
        input_stride: usize,
        output_stride: usize,
    ) -> Self {
        self.batch_count = batch_count;
        self.input_stride = input_stride;
        self.output_stride = output_stride;
        self
    }

    /// Results per reduction.
    pub fn output_len(&self) -> usize {
        match self.dim {
            ReductionDim::Inner => self.cols,
            ReductionDim::Outer => self.rows,
        }
    }

    /// Elements folded into each result.
    pub fn reduced_len(&self) -> usize {
        match self.dim {
            ReductionDim::Inner => self.rows,
            ReductionDim::Outer => self.cols,
        }
    }

    /// Offset of result `index` of batch `batch` in the output.
    pub fn output_offset(&self, batch: usize, index: usize) -> usize {
        batch * self.output_stride
            + index % self.output_rows
            + (index / self.output_rows) * self.output_ld
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ld < self.rows.max(1) {
            return Err(ConfigError::invalid_argument(
                "ld",
                format!("{} is smaller than the {} rows", self.ld, self.rows),
            ));
        }

        if self.output_rows == 0 || self.output_ld < self.output_rows {
            return Err(ConfigError::invalid_argument(
                "output_ld",
                format!(
                    "{} can't hold columns of {} results",
                    self.output_ld, self.output_rows
                ),
            ));
        }

        if self.batch_count == 0 {
            return Err(ConfigError::invalid_argument(
                "batch_count",
                "a batch holds at least one reduction",
            ));
        }

        let span = match self.output_len() {
            0 => 0,
            len => self.output_offset(0, len - 1) + 1,
        };
        if self.batch_count > 1 && self.output_stride < span {
            return Err(ConfigError::invalid_argument(
                "output_stride",
                format!(
                    "{} makes the outputs overlap, at least {span} is needed",
                    self.output_stride
                ),
            ));
        }

        Ok(())
    }

    fn input_len(&self) -> usize {
        if self.rows == 0 || self.cols == 0 {
            return 0;
        }
        (self.batch_count - 1) * self.input_stride + self.ld * (self.cols - 1) + self.rows
    }

    fn output_len_required(&self) -> usize {
        match self.output_len() {
            0 => 0,
            len => self.output_offset(self.batch_count - 1, len - 1) + 1,
        }
    }
}

/// Matrix to vector reduction, `out := alpha * reduce(input) + beta * out`.
#[derive(Debug)]
pub struct Reduction<'a, E: Element> {
    pub(crate) operator: ReduceOperator,
    pub(crate) problem: ReductionProblem,
    pub(crate) alpha: E,
    pub(crate) beta: E,
    pub(crate) input: &'a Buffer<E>,
    pub(crate) output: &'a Buffer<E>,
}

impl<'a, E: Element> Reduction<'a, E> {
    /// Reduction overwriting the output.
    pub fn new(
        operator: ReduceOperator,
        problem: ReductionProblem,
        input: &'a Buffer<E>,
        output: &'a Buffer<E>,
    ) -> Result<Self, ConfigError> {
        Self::with_epilogue(operator, problem, E::one(), input, E::zero(), output)
    }

    /// Reduction scaled by `alpha` and accumulated into `beta` times the output.
    pub fn with_epilogue(
        operator: ReduceOperator,
        problem: ReductionProblem,
        alpha: E,
        input: &'a Buffer<E>,
        beta: E,
        output: &'a Buffer<E>,
    ) -> Result<Self, ConfigError> {
        problem.validate()?;
        check_len("input", input, problem.input_len())?;
        check_len("output", output, problem.output_len_required())?;
        check_alias(("input", input), ("output", output))?;

        Ok(Self {
            operator,
            problem,
            alpha,
            beta,
            input,
            output,
        })
    }

    /// The problem.
    pub fn problem(&self) -> &ReductionProblem {
        &self.problem
    }
}

/// Vector to scalar reductions.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum VectorReduction {
    /// `Σ x`.
    Sum,
    /// `Π x`.
    Product,
    /// `max x`.
    Max,
    /// `min x`.
    Min,
    /// `Σ x / n`.
    Mean,
    /// `Σ |x|`.
    AbsSum,
    /// `sqrt(Σ x²)`.
    Norm2,
    /// `Σ x * y`.
    Dot,
    /// Smallest index of the largest `|x|`.
    IndexOfMaxAbs,
    /// Smallest index of the smallest `|x|`.
    IndexOfMinAbs,
}

impl VectorReduction {
    /// Whether the result is an index.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::IndexOfMaxAbs | Self::IndexOfMinAbs)
    }

    /// Operator folding the elements of a value reduction.
    pub fn operator(&self) -> ReduceOperator {
        match self {
            VectorReduction::Product => ReduceOperator::Product,
            VectorReduction::Max => ReduceOperator::Max,
            VectorReduction::Min => ReduceOperator::Min,
            VectorReduction::Mean => ReduceOperator::Mean,
            VectorReduction::AbsSum => ReduceOperator::AbsoluteAdd,
            VectorReduction::Norm2 => ReduceOperator::SquareAdd,
            VectorReduction::Sum
            | VectorReduction::Dot
            | VectorReduction::IndexOfMaxAbs
            | VectorReduction::IndexOfMinAbs => ReduceOperator::Add,
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            VectorReduction::Sum => "sum",
            VectorReduction::Product => "product",
            VectorReduction::Max => "max",
            VectorReduction::Min => "min",
            VectorReduction::Mean => "mean",
            VectorReduction::AbsSum => "asum",
            VectorReduction::Norm2 => "nrm2",
            VectorReduction::Dot => "dot",
            VectorReduction::IndexOfMaxAbs => "iamax",
            VectorReduction::IndexOfMinAbs => "iamin",
        }
    }
}

/// Where the scalar result of a vector reduction is written.
#[derive(Debug)]
pub enum ReductionTarget<'a, E: Element> {
    /// First element of a buffer of values.
    Value(&'a Buffer<E>),
    /// First element of a buffer of indices.
    Index(&'a Buffer<u64>),
}

/// Vector to scalar reduction, run as a partial stage followed by a final stage.
#[derive(Debug)]
pub struct AssignReduction<'a, E: Element> {
    pub(crate) kind: VectorReduction,
    pub(crate) n: usize,
    pub(crate) x: StridedVector<'a, E>,
    pub(crate) y: Option<StridedVector<'a, E>>,
    pub(crate) target: ReductionTarget<'a, E>,
}

impl<'a, E: Element> AssignReduction<'a, E> {
    /// Reduce the `n` elements of `x`.
    ///
    /// Index reductions need an [index](ReductionTarget::Index) target, the others a
    /// [value](ReductionTarget::Value) target; [dot](VectorReduction::Dot) is built with
    /// [dot](AssignReduction::dot).
    pub fn new(
        kind: VectorReduction,
        n: usize,
        x: StridedVector<'a, E>,
        target: ReductionTarget<'a, E>,
    ) -> Result<Self, ConfigError> {
        if kind == VectorReduction::Dot {
            return Err(ConfigError::invalid_argument(
                "kind",
                "a dot product needs a second vector",
            ));
        }
        Self::build(kind, n, x, None, target)
    }

    /// `result := Σ x * y` over `n` elements.
    pub fn dot(
        n: usize,
        x: StridedVector<'a, E>,
        y: StridedVector<'a, E>,
        result: &'a Buffer<E>,
    ) -> Result<Self, ConfigError> {
        Self::build(
            VectorReduction::Dot,
            n,
            x,
            Some(y),
            ReductionTarget::Value(result),
        )
    }

    fn build(
        kind: VectorReduction,
        n: usize,
        x: StridedVector<'a, E>,
        y: Option<StridedVector<'a, E>>,
        target: ReductionTarget<'a, E>,
    ) -> Result<Self, ConfigError> {
        x.check("x", n)?;
        if let Some(y) = &y {
            y.check("y", n)?;
        }

        match (&target, kind.is_index()) {
            (ReductionTarget::Value(result), false) => {
                check_len("result", result, 1)?;
                check_alias(("x", x.buffer), ("result", result))?;
                if let Some(y) = &y {
                    check_alias(("y", y.buffer), ("result", result))?;
                }
            }
            (ReductionTarget::Index(result), true) => {
                check_len("result", result, 1)?;
            }
            (_, true) => {
                return Err(ConfigError::invalid_argument(
                    "result",
                    format!("{} writes an index", kind.name()),
                ));
            }
            (_, false) => {
                return Err(ConfigError::invalid_argument(
                    "result",
                    format!("{} writes a value", kind.name()),
                ));
            }
        }

        Ok(Self {
            kind,
            n,
            x,
            y,
            target,
        })
    }

    /// The reduction.
    pub fn kind(&self) -> VectorReduction {
        self.kind
    }

    /// Number of reduced elements.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether no element is reduced.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}
