use std::collections::BTreeSet;

use crate::config::device::DeviceConfig;

/// Hardware family the device belongs to.
///
/// The family selects the tuning table used when picking a launch configuration.
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
pub enum TargetFamily {
    /// Renesas R-Car class accelerators.
    #[serde(rename = "rcar")]
    Rcar,
    /// Any other device.
    #[default]
    #[serde(rename = "generic")]
    Generic,
}

impl TargetFamily {
    /// Parse a family from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rcar" | "r-car" => Some(Self::Rcar),
            "generic" | "default" => Some(Self::Generic),
            _ => None,
        }
    }
}

impl core::fmt::Display for TargetFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TargetFamily::Rcar => f.write_str("rcar"),
            TargetFamily::Generic => f.write_str("generic"),
        }
    }
}

/// Optional device capabilities.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feature {
    /// Sub-group matrix multiply-accumulate fragments.
    JointMatrix,
    /// Double precision arithmetic.
    Fp64,
}

/// Properties of what the device can do, queried once when a queue is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    family: TargetFamily,
    max_workgroup_size: u32,
    local_memory: bool,
    max_local_memory_size: usize,
    compute_units: u32,
    features: BTreeSet<Feature>,
}

impl DeviceProperties {
    /// Create the properties of a device without any optional [feature](Feature).
    pub fn new(
        family: TargetFamily,
        max_workgroup_size: u32,
        local_memory: bool,
        max_local_memory_size: usize,
        compute_units: u32,
    ) -> Self {
        Self {
            family,
            max_workgroup_size,
            local_memory,
            max_local_memory_size: if local_memory {
                max_local_memory_size
            } else {
                0
            },
            compute_units: compute_units.max(1),
            features: BTreeSet::new(),
        }
    }

    /// Build the properties described by the device section of the configuration.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let compute_units = config.compute_units.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|count| count.get() as u32)
                .unwrap_or(1)
        });

        let mut props = Self::new(
            config.family,
            config.max_workgroup_size,
            config.local_memory,
            config.max_local_memory_size,
            compute_units,
        );

        if config.joint_matrix {
            props.register_feature(Feature::JointMatrix);
        }
        if config.fp64 {
            props.register_feature(Feature::Fp64);
        }

        props
    }

    /// Register a supported [feature](Feature).
    pub fn register_feature(&mut self, feature: Feature) -> bool {
        self.features.insert(feature)
    }

    /// Same properties with the given [feature](Feature) registered.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.register_feature(feature);
        self
    }

    /// Check if the provided [feature](Feature) is supported by the device.
    pub fn feature_enabled(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// The hardware family.
    pub fn family(&self) -> TargetFamily {
        self.family
    }

    /// Maximum number of work items in one workgroup.
    pub fn max_workgroup_size(&self) -> u32 {
        self.max_workgroup_size
    }

    /// Whether workgroup-shared local memory exists.
    pub fn has_local_memory(&self) -> bool {
        self.local_memory
    }

    /// Maximum local memory per workgroup in bytes, zero without local memory.
    pub fn max_local_memory_size(&self) -> usize {
        self.max_local_memory_size
    }

    /// Number of compute units.
    pub fn compute_units(&self) -> u32 {
        self.compute_units
    }
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self::from_config(&DeviceConfig::default())
    }
}
