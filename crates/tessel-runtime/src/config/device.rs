use crate::device::TargetFamily;

/// Description of the emulated device the default queue is created for.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DeviceConfig {
    /// Hardware family, keys the dispatch tuning table.
    #[serde(default)]
    pub family: TargetFamily,

    /// Maximum work items per workgroup.
    #[serde(default = "max_workgroup_size_default")]
    pub max_workgroup_size: u32,

    /// Whether workgroup-shared local memory is available.
    #[serde(default = "local_memory_default")]
    pub local_memory: bool,

    /// Local memory per workgroup, in bytes.
    #[serde(default = "max_local_memory_size_default")]
    pub max_local_memory_size: usize,

    /// Compute unit count, defaults to the available parallelism of the host.
    #[serde(default)]
    pub compute_units: Option<u32>,

    /// Whether sub-group matrix fragments are supported.
    #[serde(default)]
    pub joint_matrix: bool,

    /// Whether double precision is supported.
    #[serde(default = "fp64_default")]
    pub fp64: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            family: TargetFamily::default(),
            max_workgroup_size: max_workgroup_size_default(),
            local_memory: local_memory_default(),
            max_local_memory_size: max_local_memory_size_default(),
            compute_units: None,
            joint_matrix: false,
            fp64: fp64_default(),
        }
    }
}

fn max_workgroup_size_default() -> u32 {
    256
}

fn local_memory_default() -> bool {
    true
}

fn max_local_memory_size_default() -> usize {
    64 * 1024
}

fn fp64_default() -> bool {
    true
}
