use super::GlobalConfig;
use crate::config::{launch::LaunchLogLevel, profiling::ProfilingLogLevel};
use core::fmt::Display;
use hashbrown::HashMap;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

/// Configuration for logging in Tessel, parameterized by a log level type.
///
/// Note that you can use multiple loggers at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Optional crate-level logging configuration (e.g., info, debug, trace).
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level for this logger, determining verbosity.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in `LoggerConfig`.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Binary log level for enabling or disabling logging.
#[derive(Default, Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum BinaryLogLevel {
    /// Logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Logging is fully enabled.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for BinaryLogLevel {}

/// Central logging utility for Tessel, managing multiple log outputs.
#[derive(Debug)]
pub struct Logger {
    loggers: Vec<LoggerKind>,
    launch_index: Vec<usize>,
    profiling_index: Vec<usize>,

    /// Global configuration for logging settings.
    pub config: Arc<GlobalConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Hash, PartialEq, Eq)]
enum LoggerId {
    File(PathBuf),
    Stdout,
    Stderr,
    LogCrate(LogCrateLevel),
}

#[derive(Default)]
struct LoggerRegistry {
    loggers: Vec<LoggerKind>,
    ids: HashMap<LoggerId, usize>,
}

impl LoggerRegistry {
    fn register<L: LogLevel>(&mut self, config: &LoggerConfig<L>, setting_index: &mut Vec<usize>) {
        if let Some(file) = &config.file {
            let append = config.append;
            self.insert(setting_index, LoggerId::File(file.clone()), || {
                FileLogger::new(file, append).map(LoggerKind::File)
            });
        }

        if config.stdout {
            self.insert(setting_index, LoggerId::Stdout, || Some(LoggerKind::Stdout));
        }

        if config.stderr {
            self.insert(setting_index, LoggerId::Stderr, || Some(LoggerKind::Stderr));
        }

        if let Some(level) = config.log {
            self.insert(setting_index, LoggerId::LogCrate(level), || {
                Some(LoggerKind::Log(level))
            });
        }
    }

    fn insert<F: FnOnce() -> Option<LoggerKind>>(
        &mut self,
        setting_index: &mut Vec<usize>,
        id: LoggerId,
        create: F,
    ) {
        if let Some(index) = self.ids.get(&id) {
            setting_index.push(*index);
            return;
        }

        if let Some(logger) = create() {
            let index = self.loggers.len();
            self.ids.insert(id, index);
            self.loggers.push(logger);
            setting_index.push(index);
        }
    }
}

impl Logger {
    /// Creates a new `Logger` instance based on the global configuration.
    ///
    /// Note that creating a logger is quite expensive.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Creates a new `Logger` instance for the given configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let mut registry = LoggerRegistry::default();
        let mut launch_index = Vec::new();
        let mut profiling_index = Vec::new();

        if !matches!(config.launch.logger.level, LaunchLogLevel::Disabled) {
            registry.register(&config.launch.logger, &mut launch_index);
        }

        if !matches!(config.profiling.logger.level, ProfilingLogLevel::Disabled) {
            registry.register(&config.profiling.logger, &mut profiling_index);
        }

        Self {
            loggers: registry.loggers,
            launch_index,
            profiling_index,
            config,
        }
    }

    /// Logs a message for kernel launches, directing it to all configured launch loggers.
    pub fn log_launch<S: Display>(&mut self, msg: &S) {
        let indices = self.launch_index.clone();
        self.log_all(msg, &indices);
    }

    /// Logs a message for profiling, directing it to all configured profiling loggers.
    pub fn log_profiling<S: Display>(&mut self, msg: &S) {
        let indices = self.profiling_index.clone();
        self.log_all(msg, &indices);
    }

    /// Returns the current launch log level from the global configuration.
    pub fn log_level_launch(&self) -> LaunchLogLevel {
        self.config.launch.logger.level
    }

    /// Returns the current profiling log level from the global configuration.
    pub fn log_level_profiling(&self) -> ProfilingLogLevel {
        self.config.profiling.logger.level
    }

    fn log_all<S: Display>(&mut self, msg: &S, indices: &[usize]) {
        match indices {
            [] => {}
            [index] => self.loggers[*index].log(msg),
            _ => {
                let msg = msg.to_string();
                for index in indices {
                    self.loggers[*index].log(&msg);
                }
            }
        }
    }
}

#[derive(Debug)]
enum LoggerKind {
    File(FileLogger),
    Stdout,
    Stderr,
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            LoggerKind::File(file_logger) => file_logger.log(msg),
            LoggerKind::Stdout => println!("{msg}"),
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

#[derive(Debug)]
struct FileLogger {
    writer: BufWriter<File>,
}

impl FileLogger {
    fn new(path: &PathBuf, append: bool) -> Option<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path);

        match file {
            Ok(file) => Some(Self {
                writer: BufWriter::new(file),
            }),
            Err(err) => {
                log::warn!("Can't open log file {}: {err}", path.display());
                None
            }
        }
    }

    fn log<S: Display>(&mut self, msg: &S) {
        let result = writeln!(self.writer, "{msg}").and_then(|_| self.writer.flush());

        if let Err(err) = result {
            log::warn!("Can't write to log file: {err}");
        }
    }
}
