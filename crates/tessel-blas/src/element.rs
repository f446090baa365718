use core::fmt::{Debug, Display};

use bytemuck::Pod;
use num_traits::Float;
use tessel_runtime::Feature;

/// Floating point element the kernels compute with.
pub trait Element: Pod + Float + Send + Sync + Debug + Display + Default + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    /// Device feature required to compute with this element, if any.
    const REQUIRES: Option<Feature>;

    /// Convert from a double, rounding when needed.
    fn from_double(value: f64) -> Self;

    /// Convert to a double.
    fn to_double(self) -> f64;
}

impl Element for f32 {
    const NAME: &'static str = "f32";
    const REQUIRES: Option<Feature> = None;

    fn from_double(value: f64) -> Self {
        value as f32
    }

    fn to_double(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";
    const REQUIRES: Option<Feature> = Some(Feature::Fp64);

    fn from_double(value: f64) -> Self {
        value
    }

    fn to_double(self) -> f64 {
        self
    }
}
