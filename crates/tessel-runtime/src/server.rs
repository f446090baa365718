use thiserror::Error;

/// Position of one kernel inside a multi-kernel operation.
///
/// A tall-skinny matrix multiply enqueues a partial-product stage then a reduction stage; a
/// failure reports which one broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, new)]
pub struct Stage {
    /// Zero-based index of the stage.
    pub index: u32,
    /// Number of stages in the operation.
    pub count: u32,
    /// Name of the stage.
    pub name: &'static str,
}

impl Stage {
    /// The only stage of a single-kernel operation.
    pub fn single(name: &'static str) -> Self {
        Self::new(0, 1, name)
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "stage {}/{} ({})", self.index + 1, self.count, self.name)
    }
}

/// Kernel launch errors, the device refused or failed one kernel.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LaunchError {
    /// The workgroup holds more work items than the device allows.
    #[error("Workgroup too large.\nRequested {requested} work items, maximum is {max}.")]
    WorkgroupTooLarge {
        /// Requested work items.
        requested: u32,
        /// Maximum work items.
        max: u32,
    },

    /// The global range can't be split into whole workgroups.
    #[error("Invalid range.\nGlobal range {global:?} isn't a multiple of local range {local:?}.")]
    InvalidRange {
        /// Global range.
        global: [u32; 3],
        /// Local range.
        local: [u32; 3],
    },

    /// Local memory was requested on a device without any.
    #[error("Local memory requested ({requested} bytes) on a device without local memory.")]
    LocalMemoryUnavailable {
        /// Requested bytes.
        requested: usize,
    },

    /// Too much local memory was requested.
    #[error("Too much local memory requested.\nRequested {requested} bytes, maximum {max} bytes available.")]
    LocalMemoryExceeded {
        /// Requested bytes.
        requested: usize,
        /// Available bytes.
        max: usize,
    },

    /// The kernel failed while running.
    #[error("Kernel failed during execution\nCaused by:\n  {reason}")]
    Kernel {
        /// The details of the failure.
        reason: String,
    },
}

impl LaunchError {
    /// Kernel failure with the given reason.
    pub fn kernel<S: Into<String>>(reason: S) -> Self {
        Self::Kernel {
            reason: reason.into(),
        }
    }
}

/// Error reported by a completion [event](crate::Event).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// A kernel or transfer failed on the device.
    #[error("Device execution failed at {stage} in {kernel}\nCaused by:\n  {source}")]
    Failed {
        /// The failing stage.
        stage: Stage,
        /// Name of the kernel or transfer.
        kernel: String,
        /// What went wrong.
        source: LaunchError,
    },

    /// The work wasn't run because one of its dependencies failed.
    #[error("Device execution skipped at {stage} because a dependency failed\nCaused by:\n  {source}")]
    DependencyFailed {
        /// The skipped stage.
        stage: Stage,
        /// The error of the failed dependency.
        source: Box<ExecutionError>,
    },

    /// The queue server stopped before the work completed.
    #[error("The device queue disconnected before the work completed")]
    Disconnected,
}

impl ExecutionError {
    /// The stage that failed, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ExecutionError::Failed { stage, .. } => Some(*stage),
            ExecutionError::DependencyFailed { stage, .. } => Some(*stage),
            ExecutionError::Disconnected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_names_the_stage() {
        let err = ExecutionError::Failed {
            stage: Stage::new(1, 2, "gemm_reduction"),
            kernel: "reduction_inner".into(),
            source: LaunchError::kernel("boom"),
        };

        assert_eq!(err.stage(), Some(Stage::new(1, 2, "gemm_reduction")));
        assert!(err.to_string().contains("stage 2/2 (gemm_reduction)"));
    }
}
