use tessel_runtime::{Buffer, Event};

use crate::{
    ConfigError, Element, ExecuteOptions, ExecutionContext,
    config::GemmConfig,
    operation::{Gemm, GemmProblem},
};

/// Tile-based matrix multiplication with one compiled configuration.
///
/// Each workgroup computes one tile of `C`. With local memory the tiles of `A` and `B` are staged
/// one cache line of depth at a time, and double buffering stages the next slice while the
/// current one is multiplied. Tall-skinny configurations split the depth across partial
/// products reduced by a second kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct GemmLauncher {
    config: GemmConfig,
}

impl From<GemmConfig> for GemmLauncher {
    fn from(config: GemmConfig) -> Self {
        Self::new(config)
    }
}

impl GemmLauncher {
    /// The configuration.
    pub fn config(&self) -> &GemmConfig {
        &self.config
    }

    /// Enqueue `C := alpha * op(A) * op(B) + beta * C`.
    #[allow(clippy::too_many_arguments)]
    pub fn launch<E: Element>(
        &self,
        context: &ExecutionContext,
        problem: GemmProblem,
        alpha: E,
        a: &Buffer<E>,
        b: &Buffer<E>,
        beta: E,
        c: &Buffer<E>,
    ) -> Result<Vec<Event>, ConfigError> {
        self.launch_with(context, problem, alpha, a, b, beta, c, ExecuteOptions::default())
    }

    /// Enqueue `C := alpha * op(A) * op(B) + beta * C` with launch options.
    #[allow(clippy::too_many_arguments)]
    pub fn launch_with<E: Element>(
        &self,
        context: &ExecutionContext,
        problem: GemmProblem,
        alpha: E,
        a: &Buffer<E>,
        b: &Buffer<E>,
        beta: E,
        c: &Buffer<E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        let gemm = Gemm::new(self.config, problem, alpha, a, b, beta, c)?;
        context.execute_with(gemm.into(), options)
    }
}
