use tessel_runtime::ExecutionError;
use thiserror::Error;

/// Configuration errors, detected before any kernel is enqueued.
///
/// Every variant names the offending parameter.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A local memory strategy was requested on a device without local memory.
    #[error("`{parameter}` requests local memory but the device has no local memory")]
    LocalMemoryUnsupported {
        /// The offending parameter.
        parameter: &'static str,
    },

    /// The workgroup is larger than what the device supports.
    #[error("`{parameter}` requests workgroups of {requested} work items, the device maximum is {max}")]
    WorkgroupTooLarge {
        /// The offending parameter.
        parameter: &'static str,
        /// Requested work items.
        requested: u32,
        /// Maximum work items.
        max: u32,
    },

    /// The configuration needs more local memory than the device has.
    #[error("The tile needs {requested} bytes of local memory, the device maximum is {max}")]
    LocalMemoryTooLarge {
        /// Requested bytes.
        requested: usize,
        /// Available bytes.
        max: usize,
    },

    /// A device feature the configuration depends on is missing.
    #[error("`{parameter}` requires the {feature} device feature")]
    FeatureUnavailable {
        /// The offending parameter.
        parameter: &'static str,
        /// The missing feature.
        feature: &'static str,
    },

    /// The tile shape is inconsistent.
    #[error("Invalid tile `{parameter}`: {reason}")]
    InvalidTile {
        /// The offending parameter.
        parameter: &'static str,
        /// Why the tile is rejected.
        reason: String,
    },

    /// An argument is out of its valid domain.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// The offending parameter.
        name: &'static str,
        /// Why the argument is rejected.
        reason: String,
    },

    /// A buffer is too small for the described operand.
    #[error("Operand `{operand}` needs {required} elements but its buffer holds {actual}")]
    OperandTooSmall {
        /// The offending operand.
        operand: &'static str,
        /// Required elements.
        required: usize,
        /// Elements in the buffer.
        actual: usize,
    },

    /// Two operands share storage where the operation writes one of them.
    #[error("Operands `{first}` and `{second}` share the same storage")]
    AliasedOperands {
        /// First operand.
        first: &'static str,
        /// Second operand.
        second: &'static str,
    },

    /// A transpose flag isn't one of `n`, `t`, `c`.
    #[error("Invalid transpose flag {value:?}, expected one of 'n', 't', 'c'")]
    InvalidTranspose {
        /// The offending flag.
        value: char,
    },
}

impl ConfigError {
    pub(crate) fn invalid_argument<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_tile<S: Into<String>>(parameter: &'static str, reason: S) -> Self {
        Self::InvalidTile {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Any error of a BLAS call, either rejected up front or failed on the device.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum BlasError {
    /// The call was rejected before enqueuing anything.
    #[error("Unable to launch because the configuration is invalid\nCaused by:\n  {0}")]
    Config(#[from] ConfigError),

    /// The device failed to execute the enqueued work.
    #[error("Device execution failed\nCaused by:\n  {0}")]
    Execution(#[from] ExecutionError),
}
