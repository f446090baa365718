//! Shape-driven selection of the compiled launcher configurations.
//!
//! The `select*` functions are pure: the same arguments always give the same configuration.
//! The `dispatch_*` functions additionally check the selection runs on the device, so
//! configuration errors surface before any launcher is invoked.

mod tuning;

pub use tuning::*;

use tessel_runtime::{DeviceProperties, TargetFamily};

use crate::{
    ConfigError, Element, Transpose,
    config::{BatchLayout, GbmvConfig, GemmConfig, GemvConfig},
    operation::GemmProblem,
};

/// GEMM configuration of an `M×N` output.
///
/// Interleaved batches always use the interleaved configuration, strided ones pick by size.
pub fn select(m: usize, n: usize, batch_layout: BatchLayout, family: TargetFamily) -> GemmConfig {
    TuningTable::for_family(family).gemm(m, n, batch_layout)
}

/// Tall-skinny GEMM configuration, when the family routes the shape to it.
pub fn select_tall_skinny(m: usize, n: usize, k: usize, family: TargetFamily) -> Option<GemmConfig> {
    TuningTable::for_family(family).gemm_tall_skinny(m, n, k)
}

/// GEMV configuration of a matrix with `m` rows.
pub fn select_gemv(m: usize, trans: Transpose, family: TargetFamily) -> GemvConfig {
    TuningTable::for_family(family).gemv(m, trans)
}

/// GBMV configuration.
pub fn select_gbmv(family: TargetFamily) -> GbmvConfig {
    TuningTable::for_family(family).gbmv
}

/// Select the GEMM configuration of a problem and check it runs on the device.
pub fn dispatch_gemm<E: Element>(
    properties: &DeviceProperties,
    problem: &GemmProblem,
) -> Result<GemmConfig, ConfigError> {
    let family = properties.family();
    let tall_skinny = match problem.batch_layout {
        BatchLayout::Strided => select_tall_skinny(problem.m, problem.n, problem.k, family),
        BatchLayout::Interleaved => None,
    };
    let config = tall_skinny
        .unwrap_or_else(|| select(problem.m, problem.n, problem.batch_layout, family));

    log::debug!(
        "Selected {config} for gemm {}x{}x{} ({:?}, batch {}) on {family}",
        problem.m,
        problem.n,
        problem.k,
        problem.batch_layout,
        problem.batch_size,
    );
    config.validate::<E>(properties)?;

    Ok(config)
}

/// Select the GEMV configuration of a matrix and check it runs on the device.
pub fn dispatch_gemv<E: Element>(
    properties: &DeviceProperties,
    m: usize,
    trans: Transpose,
) -> Result<GemvConfig, ConfigError> {
    let config = select_gemv(m, trans, properties.family());

    log::debug!("Selected {config} for gemv of {m} rows ({trans:?})");
    config.validate::<E>(properties)?;

    Ok(config)
}

/// Select the GBMV configuration and check it runs on the device.
pub fn dispatch_gbmv<E: Element>(properties: &DeviceProperties) -> Result<GbmvConfig, ConfigError> {
    let config = select_gbmv(properties.family());
    config.validate::<E>(properties)?;

    Ok(config)
}
