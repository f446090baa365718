use pretty_assertions::assert_eq;
use tessel_runtime::transfer::copy_to_device;

use super::{reference, utils::*};
use crate::{
    ConfigError, Element, ExecutionContext, asum, axpy, copy, dot, iamax, iamin, nrm2,
    operation::VectorReduction, reduce_vector, rot, rotmg, scal, sum, swap,
};

const LENGTHS: [usize; 4] = [1, 7, 256, 1000];

pub fn test_axpy<E: Element>(context: &ExecutionContext) {
    for n in LENGTHS {
        let (incx, incy) = (3, 2);
        let (x, x_host) = random_buffer::<E>(context, n * incx, 301);
        let (y, y_host) = random_buffer::<E>(context, n * incy, 302);
        let alpha = E::from_double(-1.5);

        context.wait(axpy(context, n, alpha, &x, incx, &y, incy).unwrap()).unwrap();

        let mut expected = y_host;
        reference::axpy(n, alpha, &x_host, incx, &mut expected, incy);
        assert_equals_approx(&read_buffer(context, &y).unwrap(), &expected, 0.0).unwrap();
    }
}

pub fn test_scal_copy_swap<E: Element>(context: &ExecutionContext) {
    let n = 300;
    let (x, x_host) = random_buffer::<E>(context, n * 2, 311);
    let (y, y_host) = random_buffer::<E>(context, n, 312);
    let alpha = E::from_double(0.5);

    context.wait(scal(context, n, alpha, &x, 2).unwrap()).unwrap();
    let scaled: Vec<E> = x_host
        .iter()
        .enumerate()
        .map(|(i, value)| match i % 2 {
            0 => alpha * *value,
            _ => *value,
        })
        .collect();
    assert_equals_approx(&read_buffer(context, &x).unwrap(), &scaled, 0.0).unwrap();

    context.wait(swap(context, n, &x, 2, &y, 1).unwrap()).unwrap();
    let x_after = read_buffer(context, &x).unwrap();
    let y_after = read_buffer(context, &y).unwrap();
    for i in 0..n {
        assert_eq!(x_after[2 * i], y_host[i]);
        assert_eq!(y_after[i], scaled[2 * i]);
        assert_eq!(x_after[2 * i + 1], scaled[2 * i + 1]);
    }

    let target = context.queue().empty::<E>(n);
    context.wait(copy(context, n, &x, 2, &target, 1).unwrap()).unwrap();
    assert_equals_approx(&read_buffer(context, &target).unwrap(), &y_host, 0.0).unwrap();
}

pub fn test_rot<E: Element>(context: &ExecutionContext) {
    let n = 129;
    let (x, x_host) = random_buffer::<E>(context, n, 321);
    let (y, y_host) = random_buffer::<E>(context, n, 322);
    let (c, s) = (E::from_double(0.6), E::from_double(0.8));

    context.wait(rot(context, n, &x, 1, &y, 1, c, s).unwrap()).unwrap();

    let expected_x: Vec<E> = (0..n).map(|i| c * x_host[i] + s * y_host[i]).collect();
    let expected_y: Vec<E> = (0..n).map(|i| c * y_host[i] - s * x_host[i]).collect();
    let epsilon = tolerance::<E>(1, 1, 1, 8.0);
    assert_equals_approx(&read_buffer(context, &x).unwrap(), &expected_x, epsilon).unwrap();
    assert_equals_approx(&read_buffer(context, &y).unwrap(), &expected_y, epsilon).unwrap();
}

pub fn test_vector_ops_reject_aliasing<E: Element>(context: &ExecutionContext) {
    let (x, _) = random_buffer::<E>(context, 8, 331);

    let result = axpy(context, 4, E::one(), &x, 1, &x.clone(), 1);
    assert_eq!(
        result.err(),
        Some(ConfigError::AliasedOperands {
            first: "x",
            second: "y",
        })
    );
}

pub fn test_value_reductions<E: Element>(context: &ExecutionContext) {
    for n in LENGTHS {
        let incx = 2;
        let (x, x_host) = random_buffer::<E>(context, n * incx, 341);
        let (y, y_host) = random_buffer::<E>(context, n, 342);
        let result = context.queue().empty::<E>(1);
        let epsilon = tolerance::<E>(n, 1, 1, 64.0);

        context.wait(asum(context, n, &x, incx, &result).unwrap()).unwrap();
        let expected = reference::asum(n, &x_host, incx);
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], epsilon)
            .unwrap();

        context.wait(dot(context, n, &x, incx, &y, 1, &result).unwrap()).unwrap();
        let expected = reference::dot(n, &x_host, incx, &y_host, 1);
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], epsilon)
            .unwrap();

        context.wait(nrm2(context, n, &x, incx, &result).unwrap()).unwrap();
        let expected = reference::nrm2(n, &x_host, incx);
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], epsilon)
            .unwrap();

        context.wait(sum(context, n, &y, 1, &result).unwrap()).unwrap();
        let expected = y_host.iter().fold(E::zero(), |acc, value| acc + *value);
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], epsilon)
            .unwrap();

        let events = reduce_vector(context, VectorReduction::Max, n, &y, 1, &result).unwrap();
        assert_eq!(events.len(), 2);
        context.wait(events).unwrap();
        let expected = y_host.iter().fold(E::neg_infinity(), |acc, value| acc.max(*value));
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], 0.0).unwrap();

        context
            .wait(reduce_vector(context, VectorReduction::Mean, n, &y, 1, &result).unwrap())
            .unwrap();
        let expected = y_host.iter().fold(E::zero(), |acc, value| acc + *value)
            / E::from_double(n as f64);
        assert_equals_approx(&read_buffer(context, &result).unwrap(), &[expected], epsilon)
            .unwrap();
    }
}

pub fn test_index_reductions<E: Element>(context: &ExecutionContext) {
    for n in LENGTHS {
        let (x, x_host) = random_buffer::<E>(context, n, 351);
        let result = context.queue().empty::<u64>(1);

        context.wait(iamax(context, n, &x, 1, &result).unwrap()).unwrap();
        assert_eq!(
            read_buffer(context, &result).unwrap(),
            vec![reference::iamax(n, &x_host, 1).unwrap()]
        );

        context.wait(iamin(context, n, &x, 1, &result).unwrap()).unwrap();
        assert_eq!(
            read_buffer(context, &result).unwrap(),
            vec![reference::iamin(n, &x_host, 1).unwrap()]
        );
    }
}

pub fn test_iamax_ties_take_the_first_index<E: Element>(context: &ExecutionContext) {
    let mut data = vec![E::zero(); 700];
    for index in [650, 3, 421] {
        data[index] = E::from_double(-5.0);
    }
    data[500] = E::from_double(5.0);
    let x = copy_to_device(context.queue(), &data);
    let result = context.queue().empty::<u64>(1);

    context.wait(iamax(context, data.len(), &x, 1, &result).unwrap()).unwrap();
    assert_eq!(read_buffer(context, &result).unwrap(), vec![3]);
}

pub fn test_empty_reductions<E: Element>(context: &ExecutionContext) {
    let x = context.queue().empty::<E>(0);
    let index = copy_to_device(context.queue(), &[7u64]);
    let value = copy_to_device(context.queue(), &[E::one()]);

    context.wait(iamax(context, 0, &x, 1, &index).unwrap()).unwrap();
    assert_eq!(read_buffer(context, &index).unwrap(), vec![u64::MAX]);

    context.wait(asum(context, 0, &x, 1, &value).unwrap()).unwrap();
    assert_eq!(read_buffer(context, &value).unwrap(), vec![E::zero()]);

    context
        .wait(reduce_vector(context, VectorReduction::Mean, 0, &x, 1, &value).unwrap())
        .unwrap();
    assert_eq!(read_buffer(context, &value).unwrap(), vec![E::zero()]);
}

pub fn test_reduction_kind_must_match_target<E: Element>(context: &ExecutionContext) {
    let (x, _) = random_buffer::<E>(context, 8, 361);
    let result = context.queue().empty::<E>(1);

    let err = reduce_vector(context, VectorReduction::IndexOfMaxAbs, 8, &x, 1, &result);
    assert!(matches!(
        err,
        Err(ConfigError::InvalidArgument { name: "result", .. })
    ));

    let err = reduce_vector(context, VectorReduction::Dot, 8, &x, 1, &result);
    assert!(matches!(
        err,
        Err(ConfigError::InvalidArgument { name: "kind", .. })
    ));
}

pub fn test_rotmg<E: Element>(_context: &ExecutionContext) {
    // (d1, d2, x1, y1, flag) covering each encoding, the last one rescaled.
    let cases = [
        (1.0, 1.0, 2.0, 1.0, 0.0),
        (1.0, 1.0, 1.0, 2.0, 1.0),
        (2.0, 0.5, 1.0, -4.0, 1.0),
        (1.0, 1.0, 3.0, 0.0, -2.0),
        (1.0 / 16_777_216.0 / 64.0, 1.0, 1.0, 1.0, -1.0),
    ];

    for (d1, d2, x1, y1, flag) in cases {
        let (mut d1_out, mut d2_out, mut x1_out) =
            (E::from_double(d1), E::from_double(d2), E::from_double(x1));
        let y1_in = E::from_double(y1);

        let param = rotmg(&mut d1_out, &mut d2_out, &mut x1_out, y1_in);
        assert_eq!(param[0], E::from_double(flag), "case {d1} {d2} {x1} {y1}");

        if flag == -2.0 {
            assert_eq!(
                (d1_out, d2_out, x1_out),
                (E::from_double(d1), E::from_double(d2), E::from_double(x1))
            );
            continue;
        }

        let h = reference::rotm_matrix(&param);
        let (x1_in, y1_in) = (E::from_double(x1), y1_in);
        let first = h[0][0] * x1_in + h[0][1] * y1_in;
        let second = h[1][0] * x1_in + h[1][1] * y1_in;
        let scale = x1.abs().max(y1.abs());
        let epsilon = tolerance::<E>(1, 1, 1, 16.0 * scale);

        assert_equals_approx(&[first, second], &[x1_out, E::zero()], epsilon)
            .unwrap_or_else(|err| panic!("case {d1} {d2} {x1} {y1}: {err}"));

        // The weighted norm is preserved: d1' x1'^2 = d1 x1^2 + d2 y1^2.
        let before = d1 * x1 * x1 + d2 * y1 * y1;
        let after = (d1_out * x1_out * x1_out).to_double();
        assert!(
            (after - before).abs() <= tolerance::<E>(1, 1, 1, 64.0) * before,
            "case {d1} {d2} {x1} {y1}: {after} != {before}"
        );
    }

    let (mut d1, mut d2, mut x1) = (-E::one(), E::one(), E::one());
    let param = rotmg(&mut d1, &mut d2, &mut x1, E::one());
    assert_eq!(param, [-E::one(), E::zero(), E::zero(), E::zero(), E::zero()]);
    assert_eq!((d1, d2, x1), (E::zero(), E::zero(), E::zero()));
}
