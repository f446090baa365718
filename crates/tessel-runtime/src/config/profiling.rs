use super::logger::{LogLevel, LoggerConfig};

/// Profiling of kernel durations measured by the device queue.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProfilingConfig {
    /// Logger receiving the profiled durations.
    #[serde(default)]
    pub logger: LoggerConfig<ProfilingLogLevel>,
}

/// Amount of profiling information written by the server logger.
#[derive(Default, Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum ProfilingLogLevel {
    /// Kernels aren't profiled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Only the summary of the kernels run.
    #[serde(rename = "basic")]
    Basic,

    /// The summary and the duration of each kernel.
    #[serde(rename = "medium")]
    Medium,

    /// Everything, including launch ranges and stages.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for ProfilingLogLevel {}
