use bytemuck::Pod;

use crate::server::LaunchError;

/// Global and local iteration space of a kernel launch, in up to three dimensions.
///
/// The global range counts work items, not workgroups, and must be a multiple of the local
/// range in every dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, new)]
pub struct NdRange {
    /// Work items in each dimension.
    pub global: [u32; 3],
    /// Work items per workgroup in each dimension.
    pub local: [u32; 3],
}

impl NdRange {
    /// One-dimensional range.
    pub fn linear(global: u32, local: u32) -> Self {
        Self::new([global, 1, 1], [local, 1, 1])
    }

    /// One-dimensional range of `groups` workgroups.
    pub fn groups_1d(groups: u32, local: u32) -> Self {
        Self::linear(groups * local, local)
    }

    /// Three-dimensional range of `groups` workgroups of `local` work items.
    pub fn groups_3d(groups: [u32; 3], local: [u32; 3]) -> Self {
        Self::new(
            [
                groups[0] * local[0],
                groups[1] * local[1],
                groups[2] * local[2],
            ],
            local,
        )
    }

    /// Work items per workgroup.
    pub fn workgroup_size(&self) -> u32 {
        self.local.iter().product()
    }

    /// Number of workgroups in each dimension.
    pub fn group_count(&self) -> [u32; 3] {
        [
            self.global[0] / self.local[0].max(1),
            self.global[1] / self.local[1].max(1),
            self.global[2] / self.local[2].max(1),
        ]
    }

    /// Total number of workgroups.
    pub fn num_groups(&self) -> usize {
        self.group_count().iter().map(|count| *count as usize).product()
    }

    /// Whether every dimension splits into whole workgroups.
    pub fn is_divisible(&self) -> bool {
        self.global
            .iter()
            .zip(self.local.iter())
            .all(|(global, local)| *local > 0 && global % local == 0)
    }
}

impl core::fmt::Display for NdRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [gx, gy, gz] = self.global;
        let [lx, ly, lz] = self.local;
        write!(f, "global=({gx}, {gy}, {gz}) local=({lx}, {ly}, {lz})")
    }
}

/// Position of a workgroup in the launch grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, new)]
pub struct WorkgroupId {
    /// First dimension.
    pub x: u32,
    /// Second dimension.
    pub y: u32,
    /// Third dimension.
    pub z: u32,
}

/// Workgroup-shared scratch memory, zeroed before each workgroup runs.
#[derive(Debug)]
pub struct LocalMemory {
    words: Vec<u64>,
    size: usize,
}

impl LocalMemory {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(size_of::<u64>())],
            size,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        self.words.fill(0);
    }

    /// The whole memory viewed as elements of `T`.
    pub fn view<T: Pod>(&mut self) -> &mut [T] {
        let len = self.size / size_of::<T>();
        &mut bytemuck::cast_slice_mut::<u64, T>(&mut self.words)[..len]
    }

    /// Split the memory in two views, `len_a` elements of `A` followed by `B` elements filling
    /// the rest.
    pub fn split<A: Pod, B: Pod>(&mut self, len_a: usize) -> (&mut [A], &mut [B]) {
        let words_a = (len_a * size_of::<A>()).div_ceil(size_of::<u64>());
        let words_a = words_a.min(self.words.len());
        let bytes_b = self.size.saturating_sub(words_a * size_of::<u64>());

        let (first, second) = self.words.split_at_mut(words_a);
        let first = bytemuck::cast_slice_mut::<u64, A>(first);
        let second = bytemuck::cast_slice_mut::<u64, B>(second);
        let len_a = len_a.min(first.len());
        let len_b = (bytes_b / size_of::<B>()).min(second.len());

        (&mut first[..len_a], &mut second[..len_b])
    }
}

/// The launch grid handed to a [kernel](Kernel), walks the workgroups in order.
#[derive(Debug)]
pub struct Grid<'a> {
    range: NdRange,
    local: &'a mut LocalMemory,
}

impl<'a> Grid<'a> {
    pub(crate) fn new(range: NdRange, local: &'a mut LocalMemory) -> Self {
        Self { range, local }
    }

    /// The launch range.
    pub fn range(&self) -> NdRange {
        self.range
    }

    /// Run `func` once per workgroup, x fastest, with freshly zeroed local memory.
    pub fn for_each_group<F>(&mut self, mut func: F) -> Result<(), LaunchError>
    where
        F: FnMut(WorkgroupId, &mut LocalMemory) -> Result<(), LaunchError>,
    {
        let [count_x, count_y, count_z] = self.range.group_count();

        for z in 0..count_z {
            for y in 0..count_y {
                for x in 0..count_x {
                    self.local.clear();
                    func(WorkgroupId::new(x, y, z), &mut *self.local)?;
                }
            }
        }

        Ok(())
    }
}

/// Device program executed on a [queue](crate::Queue).
///
/// The queue validates the range and local memory against the device before calling
/// [execute](Kernel::execute). Work items of a workgroup are emulated by the kernel itself, one
/// barrier-delimited phase after the other.
pub trait Kernel: Send + 'static {
    /// Name used for logging and profiling.
    fn name(&self) -> &'static str;

    /// Launch range.
    fn range(&self) -> NdRange;

    /// Local memory per workgroup in bytes.
    fn local_memory_size(&self) -> usize {
        0
    }

    /// Run every workgroup of the grid.
    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError>;
}

impl core::fmt::Debug for dyn Kernel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name())
            .field("range", &self.range())
            .field("local_memory_size", &self.local_memory_size())
            .finish()
    }
}
