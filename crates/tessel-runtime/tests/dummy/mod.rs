use tessel_runtime::{
    Buffer, DeviceProperties, Grid, Kernel, LaunchError, NdRange, Queue, TargetFamily,
};

/// Small device used by the runtime tests.
pub fn test_queue() -> Queue {
    Queue::new(DeviceProperties::new(
        TargetFamily::Generic,
        64,
        true,
        1024,
        2,
    ))
}

/// Element-wise `out = lhs + rhs`, one work item per element.
pub struct DummyElementwiseAddition {
    pub lhs: Buffer<u32>,
    pub rhs: Buffer<u32>,
    pub out: Buffer<u32>,
    pub local_size: u32,
}

impl Kernel for DummyElementwiseAddition {
    fn name(&self) -> &'static str {
        "dummy_elementwise_addition"
    }

    fn range(&self) -> NdRange {
        let len = self.out.len() as u32;
        NdRange::linear(len.div_ceil(self.local_size) * self.local_size, self.local_size)
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let lhs = self.lhs.read();
        let rhs = self.rhs.read();
        let mut out = self.out.write();
        let local_size = self.local_size;

        grid.for_each_group(|group, _local| {
            for lid in 0..local_size {
                let index = (group.x * local_size + lid) as usize;
                if index < out.len() {
                    out[index] = lhs[index] + rhs[index];
                }
            }
            Ok(())
        })
    }
}

/// Multiplies every element by two, staging values through local memory.
pub struct DummyDoubleWithLocalMemory {
    pub data: Buffer<u32>,
    pub local_size: u32,
}

impl Kernel for DummyDoubleWithLocalMemory {
    fn name(&self) -> &'static str {
        "dummy_double_local"
    }

    fn range(&self) -> NdRange {
        let len = self.data.len() as u32;
        NdRange::linear(len.div_ceil(self.local_size) * self.local_size, self.local_size)
    }

    fn local_memory_size(&self) -> usize {
        self.local_size as usize * size_of::<u32>()
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let mut data = self.data.write();
        let local_size = self.local_size;

        grid.for_each_group(|group, local| {
            let scratch = local.view::<u32>();
            let base = (group.x * local_size) as usize;

            for lid in 0..local_size as usize {
                if let Some(value) = data.get(base + lid) {
                    scratch[lid] = *value;
                }
            }
            // barrier
            for lid in 0..local_size as usize {
                if let Some(value) = data.get_mut(base + lid) {
                    *value = scratch[lid] * 2;
                }
            }
            Ok(())
        })
    }
}

/// Always fails with the given reason.
pub struct DummyFailure {
    pub reason: &'static str,
}

impl Kernel for DummyFailure {
    fn name(&self) -> &'static str {
        "dummy_failure"
    }

    fn range(&self) -> NdRange {
        NdRange::linear(1, 1)
    }

    fn execute(&self, _grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        Err(LaunchError::kernel(self.reason))
    }
}

/// Requests an arbitrary range and local memory without doing anything.
pub struct DummyShape {
    pub range: NdRange,
    pub local_memory: usize,
}

impl Kernel for DummyShape {
    fn name(&self) -> &'static str {
        "dummy_shape"
    }

    fn range(&self) -> NdRange {
        self.range
    }

    fn local_memory_size(&self) -> usize {
        self.local_memory
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        grid.for_each_group(|_, _| Ok(()))
    }
}

/// Sleeps before incrementing the first element, makes ordering bugs visible.
pub struct DummySlowIncrement {
    pub data: Buffer<u32>,
    pub millis: u64,
}

impl Kernel for DummySlowIncrement {
    fn name(&self) -> &'static str {
        "dummy_slow_increment"
    }

    fn range(&self) -> NdRange {
        NdRange::linear(1, 1)
    }

    fn execute(&self, _grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        std::thread::sleep(std::time::Duration::from_millis(self.millis));
        self.data.write()[0] += 1;
        Ok(())
    }
}
