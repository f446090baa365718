use rand::{Rng, SeedableRng, rngs::StdRng};
use tessel_runtime::{
    Buffer, DeviceProperties, Feature, Queue, TargetFamily,
    transfer::{copy_to_device, copy_to_host},
};

use crate::{BlasError, Element, ExecutionContext};

// Random values are taken in {-2, -2 + E, ..., 2 - E, 2} with E = 1 / PRECISION, so products
// and moderate sums are exact and results don't depend on the accumulation order.
const PRECISION: i32 = 4;

/// Device used by the tests: local memory, both optional features, 4 compute units.
pub fn test_device(family: TargetFamily) -> DeviceProperties {
    DeviceProperties::new(family, 256, true, 64 * 1024, 4)
        .with_feature(Feature::Fp64)
        .with_feature(Feature::JointMatrix)
}

/// Context on a new queue of the [test device](test_device).
pub fn test_context() -> ExecutionContext {
    ExecutionContext::new(Queue::new(test_device(TargetFamily::Generic)))
}

/// Context on a new queue of a device without local memory.
pub fn no_local_context() -> ExecutionContext {
    ExecutionContext::new(Queue::new(DeviceProperties::new(
        TargetFamily::Generic,
        256,
        false,
        0,
        4,
    )))
}

/// Seeded random operand data.
pub fn random_data<E: Element>(len: usize, seed: u64) -> Vec<E> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..len)
        .map(|_| {
            let value = rng.random_range(-2 * PRECISION..=2 * PRECISION);
            E::from_double(value as f64 / PRECISION as f64)
        })
        .collect()
}

/// Seeded random data on the device, returned with its host copy.
pub fn random_buffer<E: Element>(
    context: &ExecutionContext,
    len: usize,
    seed: u64,
) -> (Buffer<E>, Vec<E>) {
    let data = random_data(len, seed);
    (copy_to_device(context.queue(), &data), data)
}

/// Copy a whole buffer back to the host.
pub fn read_buffer<T: bytemuck::Pod + Send + Sync + Default>(
    context: &ExecutionContext,
    buffer: &Buffer<T>,
) -> Result<Vec<T>, BlasError> {
    let mut host = vec![T::default(); buffer.len()];
    copy_to_host(context.queue(), buffer, &mut host)?.wait()?;
    Ok(host)
}

/// Tolerance of a product over `depth` terms whose magnitudes are bounded by `scale`.
pub fn tolerance<E: Element>(m: usize, n: usize, k: usize, scale: f64) -> f64 {
    E::epsilon().to_double() * m.max(n).max(k).max(1) as f64 * scale
}

/// Compares every element within `epsilon`, NaN only matches NaN.
pub fn assert_equals_approx<E: Element>(
    actual: &[E],
    expected: &[E],
    epsilon: f64,
) -> Result<(), String> {
    if actual.len() != expected.len() {
        return Err(format!(
            "Lengths differ: actual={}, expected={}",
            actual.len(),
            expected.len()
        ));
    }

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let (a, e) = (a.to_double(), e.to_double());
        if a.is_nan() && e.is_nan() {
            continue;
        }
        if a.is_nan() || e.is_nan() || (a - e).abs() > epsilon {
            return Err(format!(
                "Values differ more than epsilon: index={i} actual={a}, expected={e}, difference={}, epsilon={epsilon}",
                (a - e).abs(),
            ));
        }
    }

    Ok(())
}
