/// Device config module.
pub mod device;
/// Launch logging config module.
pub mod launch;
/// Profiling config module.
pub mod profiling;

mod base;
mod logger;

pub use base::*;
pub use logger::{BinaryLogLevel, LogCrateLevel, LogLevel, Logger, LoggerConfig};
