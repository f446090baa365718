use super::logger::{BinaryLogLevel, LoggerConfig};

/// Logging of every kernel enqueued on a device queue.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LaunchConfig {
    /// Logger receiving one line per launch.
    #[serde(default)]
    pub logger: LoggerConfig<LaunchLogLevel>,
}

/// Launches are either all logged or not at all.
pub type LaunchLogLevel = BinaryLogLevel;
