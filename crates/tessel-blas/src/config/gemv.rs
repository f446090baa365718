use core::fmt::Display;

use tessel_runtime::DeviceProperties;

use crate::{ConfigError, Element};

/// Where the partial dot products of a GEMV workgroup are reduced.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GemvMemory {
    /// Partial sums and the cached chunk of `x` live in local memory.
    Local,
    /// Each work item owns whole output elements.
    NoLocal,
}

/// Launch configuration of matrix-vector products.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, new)]
pub struct GemvConfig {
    /// Output rows computed per workgroup.
    pub rows: u32,
    /// Work items per workgroup.
    pub workgroup_size: u32,
    /// Memory strategy.
    pub memory: GemvMemory,
}

impl GemvConfig {
    /// Local memory needed per workgroup, in bytes.
    pub fn local_memory_size<E: Element>(&self) -> usize {
        match self.memory {
            GemvMemory::Local => {
                let wg = self.workgroup_size as usize;
                (self.rows as usize * wg + wg) * size_of::<E>()
            }
            GemvMemory::NoLocal => 0,
        }
    }

    /// Check the configuration runs on the device.
    pub fn validate<E: Element>(&self, properties: &DeviceProperties) -> Result<(), ConfigError> {
        if let Some(feature) = E::REQUIRES {
            if !properties.feature_enabled(feature) {
                return Err(ConfigError::FeatureUnavailable {
                    parameter: "element",
                    feature: E::NAME,
                });
            }
        }

        if self.rows == 0 {
            return Err(ConfigError::invalid_tile("rows", "a workgroup computes no row"));
        }

        if self.workgroup_size == 0 {
            return Err(ConfigError::invalid_tile(
                "workgroup_size",
                "a workgroup has no work item",
            ));
        }

        if self.workgroup_size > properties.max_workgroup_size() {
            return Err(ConfigError::WorkgroupTooLarge {
                parameter: "workgroup_size",
                requested: self.workgroup_size,
                max: properties.max_workgroup_size(),
            });
        }

        if self.memory == GemvMemory::Local {
            if !properties.has_local_memory() {
                return Err(ConfigError::LocalMemoryUnsupported {
                    parameter: "memory",
                });
            }

            let requested = self.local_memory_size::<E>();
            let max = properties.max_local_memory_size();
            if requested > max {
                return Err(ConfigError::LocalMemoryTooLarge { requested, max });
            }
        }

        Ok(())
    }
}

impl Display for GemvConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "gemv<rows={}, wg={}, {:?}>",
            self.rows, self.workgroup_size, self.memory
        )
    }
}

/// Launch configuration of banded matrix-vector products.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, new)]
pub struct GbmvConfig {
    /// Work items per workgroup, each computes one output element.
    pub workgroup_size: u32,
}

impl GbmvConfig {
    /// Check the configuration runs on the device.
    pub fn validate<E: Element>(&self, properties: &DeviceProperties) -> Result<(), ConfigError> {
        if let Some(feature) = E::REQUIRES {
            if !properties.feature_enabled(feature) {
                return Err(ConfigError::FeatureUnavailable {
                    parameter: "element",
                    feature: E::NAME,
                });
            }
        }

        if self.workgroup_size == 0 {
            return Err(ConfigError::invalid_tile(
                "workgroup_size",
                "a workgroup has no work item",
            ));
        }

        if self.workgroup_size > properties.max_workgroup_size() {
            return Err(ConfigError::WorkgroupTooLarge {
                parameter: "workgroup_size",
                requested: self.workgroup_size,
                max: properties.max_workgroup_size(),
            });
        }

        Ok(())
    }
}
