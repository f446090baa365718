use core::fmt::Display;

use tessel_runtime::{DeviceProperties, Feature};

use crate::{ConfigError, Element};

/// Depth of one sub-group matrix fragment multiply.
pub const JOINT_MATRIX_DEPTH: usize = 8;

/// Memory arrangement of a batch of matrices.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum BatchLayout {
    /// Matrices follow each other at a fixed stride.
    #[default]
    Strided,
    /// Element `(i, j)` of every matrix is stored contiguously, batch index fastest.
    Interleaved,
}

/// Where a workgroup stages operand tiles.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GemmMemory {
    /// Sub-tiles of A and B are staged in workgroup-shared local memory.
    Local,
    /// Every work item reads global memory directly.
    NoLocal,
}

/// Algorithm variant of the kernel.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GemmAlgorithm {
    /// One kernel computing the whole depth.
    Standard,
    /// The depth is split across partial-product kernels followed by a reduction.
    TallSkinny,
    /// Local-memory kernel whose inner product runs on sub-group matrix fragments.
    JointMatrix,
}

/// How operand loads are vectorized.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GemmVectorization {
    /// Scalar loads.
    None,
    /// Vector loads for interior tiles, scalar loads on the edges.
    Partial,
    /// Vector loads everywhere.
    Full,
}

/// Shape of the tile computed by one workgroup.
///
/// A work item computes `item_rows × item_cols` outputs (times `item_batches` for interleaved
/// batches); a workgroup is `wg_rows × wg_cols` work items (times `wg_batches`). The sub-group
/// and fragment dimensions are only used by the joint matrix algorithm.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TileShape {
    /// Rows per work item.
    pub item_rows: u32,
    /// Columns per work item.
    pub item_cols: u32,
    /// Work item rows per workgroup.
    pub wg_rows: u32,
    /// Work item columns per workgroup.
    pub wg_cols: u32,
    /// Fragment rows per sub-group.
    pub sg_rows: u32,
    /// Fragment columns per sub-group.
    pub sg_cols: u32,
    /// Rows of one matrix fragment.
    pub tl_rows: u32,
    /// Columns of one matrix fragment.
    pub tl_cols: u32,
    /// Batches per work item.
    pub item_batches: u32,
    /// Work item batches per workgroup.
    pub wg_batches: u32,
}

impl TileShape {
    /// Tile without sub-group or batch dimensions.
    pub const fn new(item_rows: u32, item_cols: u32, wg_rows: u32, wg_cols: u32) -> Self {
        Self {
            item_rows,
            item_cols,
            wg_rows,
            wg_cols,
            sg_rows: 1,
            sg_cols: 1,
            tl_rows: 1,
            tl_cols: 1,
            item_batches: 1,
            wg_batches: 1,
        }
    }

    /// Same tile with batch dimensions.
    pub const fn with_batches(mut self, item_batches: u32, wg_batches: u32) -> Self {
        self.item_batches = item_batches;
        self.wg_batches = wg_batches;
        self
    }

    /// Same tile with sub-group and fragment dimensions.
    pub const fn with_fragments(
        mut self,
        sg_rows: u32,
        sg_cols: u32,
        tl_rows: u32,
        tl_cols: u32,
    ) -> Self {
        self.sg_rows = sg_rows;
        self.sg_cols = sg_cols;
        self.tl_rows = tl_rows;
        self.tl_cols = tl_cols;
        self
    }

    /// Output rows covered by one workgroup.
    pub fn block_rows(&self) -> usize {
        (self.item_rows * self.wg_rows) as usize
    }

    /// Output columns covered by one workgroup.
    pub fn block_cols(&self) -> usize {
        (self.item_cols * self.wg_cols) as usize
    }

    /// Batches covered by one workgroup.
    pub fn block_batches(&self) -> usize {
        (self.item_batches * self.wg_batches) as usize
    }

    /// Work items per workgroup.
    pub fn workgroup_size(&self) -> u32 {
        self.wg_rows * self.wg_cols * self.wg_batches
    }
}

impl Display for TileShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}x{}x{}x{}",
            self.item_rows, self.item_cols, self.wg_rows, self.wg_cols
        )?;
        if self.block_batches() > 1 {
            write!(f, "x{}x{}", self.item_batches, self.wg_batches)?;
        }
        Ok(())
    }
}

/// One compiled GEMM launcher configuration.
///
/// Selected by the [backend](crate::backend) from the problem shape, then fixed for the whole
/// launch.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct GemmConfig {
    /// Work items per workgroup.
    pub workgroup_size: u32,
    /// Load the next depth slice while computing on the current one.
    pub double_buffer: bool,
    /// Pad the staged A tile to avoid bank conflicts.
    pub conflict_a: bool,
    /// Pad the staged B tile to avoid bank conflicts.
    pub conflict_b: bool,
    /// Cache line size in bytes, sets the depth of a staged slice.
    pub cache_line_size: u32,
    /// Tile shape.
    pub tile: TileShape,
    /// Memory strategy.
    pub memory: GemmMemory,
    /// Algorithm variant.
    pub algorithm: GemmAlgorithm,
    /// Load vectorization.
    pub vectorization: GemmVectorization,
    /// Vector width in elements.
    pub vector_size: u32,
    /// Batch layout the configuration was compiled for.
    pub batch_layout: BatchLayout,
}

impl GemmConfig {
    /// Local memory, strided batches, standard algorithm, full vectorization of width 1.
    pub const fn new(workgroup_size: u32, cache_line_size: u32, tile: TileShape) -> Self {
        Self {
            workgroup_size,
            double_buffer: false,
            conflict_a: false,
            conflict_b: false,
            cache_line_size,
            tile,
            memory: GemmMemory::Local,
            algorithm: GemmAlgorithm::Standard,
            vectorization: GemmVectorization::Full,
            vector_size: 1,
            batch_layout: BatchLayout::Strided,
        }
    }

    /// Same configuration with the given memory strategy.
    pub const fn with_memory(mut self, memory: GemmMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Same configuration with the given algorithm.
    pub const fn with_algorithm(mut self, algorithm: GemmAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Same configuration with the given vectorization.
    pub const fn with_vectorization(
        mut self,
        vectorization: GemmVectorization,
        vector_size: u32,
    ) -> Self {
        self.vectorization = vectorization;
        self.vector_size = vector_size;
        self
    }

    /// Same configuration with double buffering toggled.
    pub const fn with_double_buffer(mut self, double_buffer: bool) -> Self {
        self.double_buffer = double_buffer;
        self
    }

    /// Same configuration with bank conflict padding toggled.
    pub const fn with_bank_conflicts(mut self, conflict_a: bool, conflict_b: bool) -> Self {
        self.conflict_a = conflict_a;
        self.conflict_b = conflict_b;
        self
    }

    /// Same configuration for the given batch layout.
    pub const fn with_batch_layout(mut self, batch_layout: BatchLayout) -> Self {
        self.batch_layout = batch_layout;
        self
    }

    /// Whether operand tiles are staged in local memory.
    pub fn uses_local_memory(&self) -> bool {
        matches!(self.memory, GemmMemory::Local)
    }

    /// Depth of one staged slice, one cache line of elements.
    pub fn block_depth<E: Element>(&self) -> usize {
        (self.cache_line_size as usize / size_of::<E>()).max(1)
    }

    /// Leading dimension of the staged A tile.
    pub fn tile_a_ld(&self) -> usize {
        self.tile.block_rows() + self.conflict_a as usize
    }

    /// Leading dimension of the staged B tile.
    pub fn tile_b_ld<E: Element>(&self) -> usize {
        self.block_depth::<E>() + self.conflict_b as usize
    }

    /// Elements of one staged slice of A and B.
    pub fn staged_slice_len<E: Element>(&self) -> usize {
        self.tile_a_ld() * self.block_depth::<E>() + self.tile_b_ld::<E>() * self.tile.block_cols()
    }

    /// Local memory needed per workgroup, in bytes.
    pub fn local_memory_size<E: Element>(&self) -> usize {
        if !self.uses_local_memory() {
            return 0;
        }

        let buffers = if self.double_buffer { 2 } else { 1 };
        self.staged_slice_len::<E>() * buffers * size_of::<E>()
    }

    /// Vector width used for a tile, depending on whether it is interior.
    pub fn load_width(&self, interior: bool) -> usize {
        match self.vectorization {
            GemmVectorization::None => 1,
            GemmVectorization::Partial if !interior => 1,
            GemmVectorization::Partial | GemmVectorization::Full => self.vector_size as usize,
        }
    }

    /// Check the configuration is consistent and runnable on the device.
    pub fn validate<E: Element>(&self, properties: &DeviceProperties) -> Result<(), ConfigError> {
        let tile = &self.tile;

        if let Some(feature) = E::REQUIRES {
            if !properties.feature_enabled(feature) {
                return Err(ConfigError::FeatureUnavailable {
                    parameter: "element",
                    feature: E::NAME,
                });
            }
        }

        let dims = [
            tile.item_rows,
            tile.item_cols,
            tile.wg_rows,
            tile.wg_cols,
            tile.sg_rows,
            tile.sg_cols,
            tile.tl_rows,
            tile.tl_cols,
            tile.item_batches,
            tile.wg_batches,
        ];
        if dims.contains(&0) {
            return Err(ConfigError::invalid_tile(
                "tile",
                format!("{tile} has a zero dimension"),
            ));
        }

        if tile.workgroup_size() != self.workgroup_size {
            return Err(ConfigError::invalid_tile(
                "workgroup_size",
                format!(
                    "{} work items don't match the {} of tile {tile}",
                    self.workgroup_size,
                    tile.workgroup_size()
                ),
            ));
        }

        if self.workgroup_size > properties.max_workgroup_size() {
            return Err(ConfigError::WorkgroupTooLarge {
                parameter: "workgroup_size",
                requested: self.workgroup_size,
                max: properties.max_workgroup_size(),
            });
        }

        if (self.cache_line_size as usize) < size_of::<E>()
            || self.cache_line_size as usize % size_of::<E>() != 0
        {
            return Err(ConfigError::invalid_tile(
                "cache_line_size",
                format!(
                    "{} bytes isn't a multiple of the {}-byte element",
                    self.cache_line_size,
                    size_of::<E>()
                ),
            ));
        }

        if self.vector_size == 0 || !self.vector_size.is_power_of_two() || self.vector_size > 16 {
            return Err(ConfigError::invalid_argument(
                "vector_size",
                format!("{} isn't a power of two up to 16", self.vector_size),
            ));
        }

        match self.batch_layout {
            BatchLayout::Interleaved => {
                if self.uses_local_memory() || self.algorithm != GemmAlgorithm::Standard {
                    return Err(ConfigError::invalid_argument(
                        "batch_layout",
                        "interleaved batches only run the standard algorithm without local memory",
                    ));
                }
                if tile.item_batches as usize % self.vector_size as usize != 0 {
                    return Err(ConfigError::invalid_tile(
                        "item_batches",
                        format!(
                            "{} batches per work item can't be loaded with vectors of {}",
                            tile.item_batches, self.vector_size
                        ),
                    ));
                }
            }
            BatchLayout::Strided => {
                if tile.block_batches() != 1 {
                    return Err(ConfigError::invalid_tile(
                        "wg_batches",
                        "strided batches run one batch per workgroup",
                    ));
                }
            }
        }

        if !self.uses_local_memory() && self.double_buffer {
            return Err(ConfigError::invalid_argument(
                "double_buffer",
                "double buffering needs the local memory strategy",
            ));
        }

        if self.algorithm == GemmAlgorithm::JointMatrix {
            if !properties.feature_enabled(Feature::JointMatrix) {
                return Err(ConfigError::FeatureUnavailable {
                    parameter: "algorithm",
                    feature: "joint_matrix",
                });
            }
            if !self.uses_local_memory() {
                return Err(ConfigError::invalid_argument(
                    "algorithm",
                    "joint matrix fragments are loaded from local memory",
                ));
            }
            if tile.block_rows() % tile.tl_rows as usize != 0
                || tile.block_cols() % tile.tl_cols as usize != 0
            {
                return Err(ConfigError::invalid_tile(
                    "tl_rows",
                    format!(
                        "fragments of {}x{} don't divide the {}x{} block",
                        tile.tl_rows,
                        tile.tl_cols,
                        tile.block_rows(),
                        tile.block_cols()
                    ),
                ));
            }
            if self.block_depth::<E>() % JOINT_MATRIX_DEPTH != 0 {
                return Err(ConfigError::invalid_tile(
                    "cache_line_size",
                    format!(
                        "a depth of {} isn't a multiple of the fragment depth {JOINT_MATRIX_DEPTH}",
                        self.block_depth::<E>()
                    ),
                ));
            }
        }

        if self.uses_local_memory() {
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

impl Display for GemmConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "gemm<wg={}, tile={}, cl={}, {:?}, {:?}, {:?}x{}, {:?}{}>",
            self.workgroup_size,
            self.tile,
            self.cache_line_size,
            self.memory,
            self.algorithm,
            self.vectorization,
            self.vector_size,
            self.batch_layout,
            if self.double_buffer { ", double" } else { "" },
        )
    }
}
