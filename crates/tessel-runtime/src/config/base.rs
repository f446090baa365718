use super::{device::DeviceConfig, launch::LaunchConfig, profiling::ProfilingConfig};
use crate::device::TargetFamily;
use std::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static TESSEL_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

const CONFIG_FILE_NAMES: [&str; 2] = ["tessel.toml", "Tessel.toml"];

/// Represents the global configuration for Tessel, combining device, launch logging and
/// profiling settings.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Description of the default device.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Configuration for logging kernel launches.
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Configuration for profiling kernel executions.
    #[serde(default)]
    pub profiling: ProfilingConfig,
}

/// Errors raised while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// The file can't be read.
    #[error("Can't read the configuration file\nCaused by:\n  {0}")]
    Io(#[from] std::io::Error),
    /// The file isn't valid toml for [GlobalConfig].
    #[error("The configuration file doesn't have the right format\nCaused by:\n  {0}")]
    Format(#[from] toml::de::Error),
    /// The configuration can't be serialized.
    #[error("The configuration can't be serialized\nCaused by:\n  {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it if not set.
    ///
    /// If no configuration is set, it attempts to load one from `tessel.toml` or `Tessel.toml` in
    /// the current directory or its parents, then from the user configuration directory. If no
    /// file is found, a default configuration is used. Environment variables are applied on top.
    ///
    /// # Notes
    ///
    /// Calling this function takes a global lock; read the values you need once and keep them.
    pub fn get() -> Arc<Self> {
        let mut state = TESSEL_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(Self::from_current_dir().override_from_env());
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Save the current configuration to the provided file path.
    pub fn save_default<P: AsRef<std::path::Path>>(path: P) -> Result<(), ConfigFileError> {
        let config = Self::get();
        let content = toml::to_string_pretty(config.as_ref())?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = TESSEL_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(mut self) -> Self {
        use super::{launch::LaunchLogLevel, profiling::ProfilingLogLevel};

        if let Ok(val) = std::env::var("TESSEL_DEBUG_LOG") {
            self.launch.logger.level = LaunchLogLevel::Full;
            self.profiling.logger.level = ProfilingLogLevel::Medium;

            match val.as_str() {
                "stdout" => {
                    self.launch.logger.stdout = true;
                    self.profiling.logger.stdout = true;
                }
                "stderr" => {
                    self.launch.logger.stderr = true;
                    self.profiling.logger.stderr = true;
                }
                "1" | "true" => {
                    let file_path = "/tmp/tessel.log";
                    self.launch.logger.file = Some(file_path.into());
                    self.profiling.logger.file = Some(file_path.into());
                }
                "0" | "false" => {
                    self.launch.logger.level = LaunchLogLevel::Disabled;
                    self.profiling.logger.level = ProfilingLogLevel::Disabled;
                }
                file_path => {
                    self.launch.logger.file = Some(file_path.into());
                    self.profiling.logger.file = Some(file_path.into());
                }
            }
        };

        if let Ok(val) = std::env::var("TESSEL_DEBUG_OPTION") {
            match val.as_str() {
                "debug" => {
                    self.launch.logger.level = LaunchLogLevel::Full;
                    self.profiling.logger.level = ProfilingLogLevel::Medium;
                }
                "profile" => {
                    self.profiling.logger.level = ProfilingLogLevel::Basic;
                }
                "profile-medium" => {
                    self.profiling.logger.level = ProfilingLogLevel::Medium;
                }
                "profile-full" => {
                    self.profiling.logger.level = ProfilingLogLevel::Full;
                }
                _ => {}
            }
        };

        if let Ok(val) = std::env::var("TESSEL_TARGET_FAMILY") {
            match TargetFamily::from_name(&val) {
                Some(family) => self.device.family = family,
                None => log::warn!("Unknown target family {val:?} in TESSEL_TARGET_FAMILY"),
            }
        }

        self
    }

    /// Parse a configuration from toml.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from a specified file path.
    pub fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    // Traverses up the directory tree until a valid configuration file is found or the root is
    // reached, then tries the user configuration directory.
    fn from_current_dir() -> Self {
        let mut candidates = Vec::new();

        if let Ok(mut dir) = std::env::current_dir() {
            loop {
                candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)));

                if !dir.pop() {
                    break;
                }
            }
        }

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("tessel").join(CONFIG_FILE_NAMES[0]));
        }

        for path in candidates {
            match Self::from_file_path(&path) {
                Ok(config) => return config,
                Err(ConfigFileError::Io(_)) => {}
                Err(err) => {
                    log::warn!("Ignoring configuration file {}: {err}", path.display());
                }
            }
        }

        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{launch::LaunchLogLevel, profiling::ProfilingLogLevel};

    #[test]
    fn parse_device_section() {
        let config = GlobalConfig::from_toml(
            r#"
            [device]
            family = "rcar"
            max_workgroup_size = 128
            local_memory = false
            compute_units = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.device.family, TargetFamily::Rcar);
        assert_eq!(config.device.max_workgroup_size, 128);
        assert!(!config.device.local_memory);
        assert_eq!(config.device.compute_units, Some(3));
        assert!(config.device.fp64);
    }

    #[test]
    fn parse_logger_sections() {
        let config = GlobalConfig::from_toml(
            r#"
            [launch.logger]
            level = "full"
            stdout = true

            [profiling.logger]
            level = "basic"
            log = "debug"
            "#,
        )
        .unwrap();

        assert!(matches!(config.launch.logger.level, LaunchLogLevel::Full));
        assert!(config.launch.logger.stdout);
        assert!(matches!(
            config.profiling.logger.level,
            ProfilingLogLevel::Basic
        ));
    }

    #[test]
    fn parse_every_profiling_level() {
        let parse = |level: &str| {
            GlobalConfig::from_toml(&format!("[profiling.logger]\nlevel = \"{level}\""))
                .unwrap()
                .profiling
                .logger
                .level
        };

        assert!(matches!(parse("disabled"), ProfilingLogLevel::Disabled));
        assert!(matches!(parse("basic"), ProfilingLogLevel::Basic));
        assert!(matches!(parse("medium"), ProfilingLogLevel::Medium));
        assert!(matches!(parse("full"), ProfilingLogLevel::Full));
    }

    #[test]
    fn invalid_file_is_a_format_error() {
        let result = GlobalConfig::from_toml("[device]\nmax_workgroup_size = \"many\"");

        assert!(matches!(result, Err(ConfigFileError::Format(_))));
    }

    #[test]
    fn empty_file_is_the_default() {
        let config = GlobalConfig::from_toml("").unwrap();

        assert_eq!(config.device.max_workgroup_size, 256);
        assert!(matches!(
            config.profiling.logger.level,
            ProfilingLogLevel::Disabled
        ));
    }

    #[test]
    #[serial_test::serial]
    fn env_overrides_family_and_logging() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe {
            std::env::set_var("TESSEL_TARGET_FAMILY", "rcar");
            std::env::set_var("TESSEL_DEBUG_LOG", "stderr");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TESSEL_TARGET_FAMILY");
            std::env::remove_var("TESSEL_DEBUG_LOG");
        }

        assert_eq!(config.device.family, TargetFamily::Rcar);
        assert!(config.launch.logger.stderr);
        assert!(matches!(config.launch.logger.level, LaunchLogLevel::Full));
    }

    #[test]
    #[serial_test::serial]
    fn unknown_family_is_ignored() {
        unsafe {
            std::env::set_var("TESSEL_TARGET_FAMILY", "quantum");
        }

        let config = GlobalConfig::default().override_from_env();

        unsafe {
            std::env::remove_var("TESSEL_TARGET_FAMILY");
        }

        assert_eq!(config.device.family, TargetFamily::Generic);
    }
}
