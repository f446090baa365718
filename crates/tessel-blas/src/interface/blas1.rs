use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecutionContext,
    operation::{AssignReduction, ReductionTarget, StridedVector, VectorOp, VectorReduction},
};

/// `y := alpha * x + y`.
pub fn axpy<E: Element>(
    context: &ExecutionContext,
    n: usize,
    alpha: E,
    x: &Buffer<E>,
    incx: usize,
    y: &Buffer<E>,
    incy: usize,
) -> Result<Vec<Event>, ConfigError> {
    let op = VectorOp::axpy(
        n,
        alpha,
        StridedVector::new(x, incx),
        StridedVector::new(y, incy),
    )?;
    context.execute(op.into())
}

/// `x := alpha * x`.
pub fn scal<E: Element>(
    context: &ExecutionContext,
    n: usize,
    alpha: E,
    x: &Buffer<E>,
    incx: usize,
) -> Result<Vec<Event>, ConfigError> {
    let op = VectorOp::scal(n, alpha, StridedVector::new(x, incx))?;
    context.execute(op.into())
}

/// `y := x`.
pub fn copy<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    y: &Buffer<E>,
    incy: usize,
) -> Result<Vec<Event>, ConfigError> {
    let op = VectorOp::copy(n, StridedVector::new(x, incx), StridedVector::new(y, incy))?;
    context.execute(op.into())
}

/// Exchange `x` and `y`.
pub fn swap<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    y: &Buffer<E>,
    incy: usize,
) -> Result<Vec<Event>, ConfigError> {
    let op = VectorOp::swap(n, StridedVector::new(x, incx), StridedVector::new(y, incy))?;
    context.execute(op.into())
}

/// Apply the plane rotation `(c, s)` to the pairs of `x` and `y`.
#[allow(clippy::too_many_arguments)]
pub fn rot<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    y: &Buffer<E>,
    incy: usize,
    c: E,
    s: E,
) -> Result<Vec<Event>, ConfigError> {
    let op = VectorOp::rot(
        n,
        StridedVector::new(x, incx),
        StridedVector::new(y, incy),
        c,
        s,
    )?;
    context.execute(op.into())
}

/// Construct the Givens rotation zeroing `b`, on the host.
///
/// On return `a` holds `r` and `b` the reconstruction value `z`; the rotation `(c, s)` is
/// returned.
pub fn rotg<E: Element>(a: &mut E, b: &mut E) -> (E, E) {
    let (abs_a, abs_b) = (a.abs(), b.abs());
    let roe = if abs_a > abs_b { *a } else { *b };
    let scale = abs_a + abs_b;

    if scale == E::zero() {
        *a = E::zero();
        *b = E::zero();
        return (E::one(), E::zero());
    }

    let r = scale * ((*a / scale).powi(2) + (*b / scale).powi(2)).sqrt();
    let r = if roe < E::zero() { -r } else { r };
    let c = *a / r;
    let s = *b / r;

    let z = if abs_a > abs_b {
        s
    } else if c != E::zero() {
        E::one() / c
    } else {
        E::one()
    };

    *a = r;
    *b = z;
    (c, s)
}

/// Construct the modified Givens rotation zeroing the second component of
/// `(sqrt(d1) * x1, sqrt(d2) * y1)`, on the host.
///
/// Returns `param = [flag, h11, h21, h12, h22]` in the BLAS encoding, entries implied by the
/// flag are left at zero:
///
/// - `-1`: `H = [[h11, h12], [h21, h22]]`
/// - `0`: `H = [[1, h12], [h21, 1]]`
/// - `1`: `H = [[h11, 1], [-1, h22]]`
/// - `-2`: `H` is the identity.
///
/// `d1`, `d2` and `x1` are updated in place; `d1 < 0` zeroes them with flag `-1`.
pub fn rotmg<E: Element>(d1: &mut E, d2: &mut E, x1: &mut E, y1: E) -> [E; 5] {
    let zero = E::zero();
    let one = E::one();
    let gam = E::from_double(4096.0);
    let gam_sq = gam * gam;
    let rgam_sq = one / gam_sq;

    let (mut h11, mut h21, mut h12, mut h22) = (zero, zero, zero, zero);
    let mut flag = -one;

    let zeroed = |d1: &mut E, d2: &mut E, x1: &mut E| {
        *d1 = zero;
        *d2 = zero;
        *x1 = zero;
    };

    if *d1 < zero {
        zeroed(d1, d2, x1);
        return [flag, zero, zero, zero, zero];
    }

    let p2 = *d2 * y1;
    if p2 == zero {
        return [E::from_double(-2.0), zero, zero, zero, zero];
    }

    let p1 = *d1 * *x1;
    let q2 = p2 * y1;
    let q1 = p1 * *x1;

    if q1.abs() > q2.abs() {
        h21 = -y1 / *x1;
        h12 = p2 / p1;
        let u = one - h12 * h21;
        if u <= zero {
            zeroed(d1, d2, x1);
            return [flag, zero, zero, zero, zero];
        }
        flag = zero;
        *d1 = *d1 / u;
        *d2 = *d2 / u;
        *x1 = *x1 * u;
    } else {
        if q2 < zero {
            zeroed(d1, d2, x1);
            return [flag, zero, zero, zero, zero];
        }
        flag = one;
        h11 = p1 / p2;
        h22 = *x1 / y1;
        let u = one + h11 * h22;
        let temp = *d2 / u;
        *d2 = *d1 / u;
        *d1 = temp;
        *x1 = y1 * u;
    }

    // Rescaling switches to the full matrix form.
    let expand = |flag: &mut E, h11: &mut E, h21: &mut E, h12: &mut E, h22: &mut E| {
        if *flag == zero {
            *h11 = one;
            *h22 = one;
        } else if *flag == one {
            *h21 = -one;
            *h12 = one;
        }
        *flag = -one;
    };

    if *d1 != zero {
        while *d1 <= rgam_sq || *d1 >= gam_sq {
            expand(&mut flag, &mut h11, &mut h21, &mut h12, &mut h22);
            if *d1 <= rgam_sq {
                *d1 = *d1 * gam_sq;
                *x1 = *x1 / gam;
                h11 = h11 / gam;
                h12 = h12 / gam;
            } else {
                *d1 = *d1 / gam_sq;
                *x1 = *x1 * gam;
                h11 = h11 * gam;
                h12 = h12 * gam;
            }
        }
    }

    if *d2 != zero {
        while d2.abs() <= rgam_sq || d2.abs() >= gam_sq {
            expand(&mut flag, &mut h11, &mut h21, &mut h12, &mut h22);
            if d2.abs() <= rgam_sq {
                *d2 = *d2 * gam_sq;
                h21 = h21 / gam;
                h22 = h22 / gam;
            } else {
                *d2 = *d2 / gam_sq;
                h21 = h21 * gam;
                h22 = h22 * gam;
            }
        }
    }

    if flag < zero {
        [flag, h11, h21, h12, h22]
    } else if flag == zero {
        [flag, zero, h21, h12, zero]
    } else {
        [flag, h11, zero, zero, h22]
    }
}

/// `result[0] := Σ |x|`.
pub fn asum<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    value_reduction(context, VectorReduction::AbsSum, n, x, incx, result)
}

/// `result[0] := Σ x * y`.
pub fn dot<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    y: &Buffer<E>,
    incy: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    let reduction = AssignReduction::dot(
        n,
        StridedVector::new(x, incx),
        StridedVector::new(y, incy),
        result,
    )?;
    context.execute(reduction.into())
}

/// `result[0] := sqrt(Σ x²)`.
pub fn nrm2<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    value_reduction(context, VectorReduction::Norm2, n, x, incx, result)
}

/// `result[0] :=` 0-based index of the first largest `|x|`, `u64::MAX` when `n` is zero.
pub fn iamax<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<u64>,
) -> Result<Vec<Event>, ConfigError> {
    index_reduction(context, VectorReduction::IndexOfMaxAbs, n, x, incx, result)
}

/// `result[0] :=` 0-based index of the first smallest `|x|`, `u64::MAX` when `n` is zero.
pub fn iamin<E: Element>(
    context: &ExecutionContext,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<u64>,
) -> Result<Vec<Event>, ConfigError> {
    index_reduction(context, VectorReduction::IndexOfMinAbs, n, x, incx, result)
}

pub(crate) fn value_reduction<E: Element>(
    context: &ExecutionContext,
    kind: VectorReduction,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<E>,
) -> Result<Vec<Event>, ConfigError> {
    let reduction = AssignReduction::new(
        kind,
        n,
        StridedVector::new(x, incx),
        ReductionTarget::Value(result),
    )?;
    context.execute(reduction.into())
}

fn index_reduction<E: Element>(
    context: &ExecutionContext,
    kind: VectorReduction,
    n: usize,
    x: &Buffer<E>,
    incx: usize,
    result: &Buffer<u64>,
) -> Result<Vec<Event>, ConfigError> {
    let reduction = AssignReduction::new(
        kind,
        n,
        StridedVector::new(x, incx),
        ReductionTarget::Index(result),
    )?;
    context.execute(reduction.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotg_zeroes_the_second_component() {
        let (mut a, mut b) = (3.0f64, 4.0);
        let (c, s) = rotg(&mut a, &mut b);

        assert!((a - 5.0).abs() < 1e-12);
        assert!((c - 0.6).abs() < 1e-12);
        assert!((s - 0.8).abs() < 1e-12);
        assert!((-s * 3.0 + c * 4.0).abs() < 1e-12);
        assert!((b - 1.0 / 0.6).abs() < 1e-12);
    }

    #[test]
    fn rotg_of_zero() {
        let (mut a, mut b) = (0.0f32, 0.0);

        assert_eq!(rotg(&mut a, &mut b), (1.0, 0.0));
        assert_eq!((a, b), (0.0, 0.0));
    }

    #[test]
    fn rotg_keeps_the_sign_of_the_largest() {
        let (mut a, mut b) = (-4.0f64, 3.0);
        let (c, s) = rotg(&mut a, &mut b);

        assert!((a + 5.0).abs() < 1e-12);
        assert!((c - 0.8).abs() < 1e-12);
        assert!((s + 0.6).abs() < 1e-12);
        assert!((b - s).abs() < 1e-12);
    }
}
