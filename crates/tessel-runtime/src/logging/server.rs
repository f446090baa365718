use core::fmt::Display;
use core::time::Duration;
use std::sync::Arc;

use crate::config::{GlobalConfig, Logger, launch::LaunchLogLevel, profiling::ProfilingLogLevel};

use super::{ProfileLevel, Profiled};

/// Logger owned by a queue server, records launches and kernel durations.
#[derive(Debug, Default)]
pub struct ServerLogger {
    kind: DebugLoggerKind,
    profiled: Profiled,
}

#[derive(Debug)]
enum ServerLoggerOptions {
    /// Log each launch.
    LaunchOnly,
    /// Profile each kernel executed.
    ProfileOnly(ProfileLevel),
    /// Enable all options.
    All(ProfileLevel),
}

#[derive(Debug, Default)]
enum DebugLoggerKind {
    Activated(Logger, ServerLoggerOptions),
    #[default]
    None,
}

impl ServerLogger {
    /// Create a server logger from the global configuration.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Create a server logger from the given configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        Self {
            kind: DebugLoggerKind::from_config(config),
            profiled: Profiled::default(),
        }
    }

    /// Returns the profile level, none if profiling is deactivated.
    pub fn profile_level(&self) -> Option<ProfileLevel> {
        self.kind.profile_level()
    }

    /// Returns true if launches should be logged.
    pub fn launch_activated(&self) -> bool {
        matches!(
            self.kind,
            DebugLoggerKind::Activated(
                _,
                ServerLoggerOptions::LaunchOnly | ServerLoggerOptions::All(_)
            )
        )
    }

    /// Register a profiled task.
    pub fn register_profiled<Name: Display>(&mut self, name: Name, duration: Duration) {
        if self.profile_level().is_none() {
            return;
        }

        let name = name.to_string();
        self.profiled.update(&name, duration);

        match self.profile_level() {
            Some(ProfileLevel::Medium | ProfileLevel::Full) => {
                if let DebugLoggerKind::Activated(logger, _) = &mut self.kind {
                    logger.log_profiling(&format!("| {duration:<10?} | {name}"));
                }
            }
            _ => {}
        }
    }

    /// Log the argument when the launch logger is activated.
    pub fn log_launch<I: Display>(&mut self, arg: I) -> I {
        if let DebugLoggerKind::Activated(
            logger,
            ServerLoggerOptions::LaunchOnly | ServerLoggerOptions::All(_),
        ) = &mut self.kind
        {
            logger.log_launch(&arg);
        }
        arg
    }

    /// Show the profiling summary if activated and reset its state.
    pub fn profile_summary(&mut self) {
        if self.profile_level().is_none() {
            return;
        }

        let profiled = core::mem::take(&mut self.profiled);

        if let DebugLoggerKind::Activated(logger, _) = &mut self.kind {
            if !profiled.is_empty() {
                logger.log_profiling(&profiled);
            }
        }
    }
}

impl DebugLoggerKind {
    fn from_config(config: Arc<GlobalConfig>) -> Self {
        let profile = match config.profiling.logger.level {
            ProfilingLogLevel::Disabled => None,
            ProfilingLogLevel::Basic => Some(ProfileLevel::Basic),
            ProfilingLogLevel::Medium => Some(ProfileLevel::Medium),
            ProfilingLogLevel::Full => Some(ProfileLevel::Full),
        };
        let launch = matches!(config.launch.logger.level, LaunchLogLevel::Full);

        let option = match (profile, launch) {
            (Some(level), true) => ServerLoggerOptions::All(level),
            (Some(level), false) => ServerLoggerOptions::ProfileOnly(level),
            (None, true) => ServerLoggerOptions::LaunchOnly,
            (None, false) => return Self::None,
        };

        Self::Activated(Logger::from_config(config), option)
    }

    fn profile_level(&self) -> Option<ProfileLevel> {
        match self {
            DebugLoggerKind::Activated(_, option) => match option {
                ServerLoggerOptions::LaunchOnly => None,
                ServerLoggerOptions::ProfileOnly(level) => Some(*level),
                ServerLoggerOptions::All(level) => Some(*level),
            },
            DebugLoggerKind::None => None,
        }
    }
}
