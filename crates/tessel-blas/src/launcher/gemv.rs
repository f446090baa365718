use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecuteOptions, ExecutionContext,
    config::{GbmvConfig, GemvConfig},
    operation::{Gbmv, GbmvProblem, Gemv, GemvProblem, StridedVector},
};

/// Dense matrix-vector product with one compiled configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct GemvLauncher {
    config: GemvConfig,
}

impl GemvLauncher {
    /// The configuration.
    pub fn config(&self) -> &GemvConfig {
        &self.config
    }

    /// Enqueue `y := alpha * op(A) * x + beta * y`.
    #[allow(clippy::too_many_arguments)]
    pub fn launch<E: Element>(
        &self,
        context: &ExecutionContext,
        problem: GemvProblem,
        alpha: E,
        a: &Buffer<E>,
        x: StridedVector<'_, E>,
        beta: E,
        y: StridedVector<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        let gemv = Gemv::new(self.config, problem, alpha, a, x, beta, y)?;
        context.execute_with(gemv.into(), options)
    }
}

/// Banded matrix-vector product with one compiled configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct GbmvLauncher {
    config: GbmvConfig,
}

impl GbmvLauncher {
    /// The configuration.
    pub fn config(&self) -> &GbmvConfig {
        &self.config
    }

    /// Enqueue `y := alpha * op(A) * x + beta * y` over a band matrix.
    #[allow(clippy::too_many_arguments)]
    pub fn launch<E: Element>(
        &self,
        context: &ExecutionContext,
        problem: GbmvProblem,
        alpha: E,
        a: &Buffer<E>,
        x: StridedVector<'_, E>,
        beta: E,
        y: StridedVector<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        let gbmv = Gbmv::new(self.config, problem, alpha, a, x, beta, y)?;
        context.execute_with(gbmv.into(), options)
    }
}
