use tessel_runtime::TargetFamily;

use crate::{
    Transpose,
    config::{
        BatchLayout, GbmvConfig, GemmAlgorithm, GemmConfig, GemmMemory, GemmVectorization,
        GemvConfig, GemvMemory, TileShape,
    },
};

const GEMM_INTERLEAVED: GemmConfig =
    GemmConfig::new(64, 64, TileShape::new(4, 4, 4, 4).with_batches(4, 4))
        .with_memory(GemmMemory::NoLocal)
        .with_vectorization(GemmVectorization::Full, 4)
        .with_batch_layout(BatchLayout::Interleaved);

const GEMM_SMALL: GemmConfig = GemmConfig::new(32, 128, TileShape::new(4, 8, 8, 4))
    .with_vectorization(GemmVectorization::Full, 4);

const GEMM_LARGE: GemmConfig = GemmConfig::new(32, 128, TileShape::new(8, 4, 4, 8))
    .with_vectorization(GemmVectorization::Full, 4);

const GEMM_TALL_SKINNY: GemmConfig = GemmConfig::new(16, 64, TileShape::new(4, 4, 4, 4))
    .with_algorithm(GemmAlgorithm::TallSkinny)
    .with_vectorization(GemmVectorization::Full, 4);

const GEMV_DEFAULT: GemvConfig = GemvConfig {
    rows: 32,
    workgroup_size: 64,
    memory: GemvMemory::Local,
};

const GEMV_TRANSPOSED: [(usize, GemvConfig); 2] = [
    (
        1024,
        GemvConfig {
            rows: 8,
            workgroup_size: 64,
            memory: GemvMemory::Local,
        },
    ),
    (
        512,
        GemvConfig {
            rows: 16,
            workgroup_size: 64,
            memory: GemvMemory::Local,
        },
    ),
];

const GBMV_DEFAULT: GbmvConfig = GbmvConfig { workgroup_size: 64 };

/// Shapes routed to the tall-skinny algorithm: small outputs with a long contraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TallSkinnyRule {
    /// Largest `M` and `N` handled.
    pub max_dim: usize,
    /// Minimum ratio between `K` and the largest of `M` and `N`.
    pub depth_ratio: usize,
    /// Configuration used when the rule matches.
    pub config: GemmConfig,
}

impl TallSkinnyRule {
    /// Whether the shape is handled by the rule.
    pub fn matches(&self, m: usize, n: usize, k: usize) -> bool {
        m <= self.max_dim && n <= self.max_dim && k >= self.depth_ratio * m.max(n)
    }
}

/// Measured launcher configurations of one hardware family.
///
/// The thresholds and shapes are tuning data, not derived from a formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TuningTable {
    /// Family the table was measured on.
    pub family: TargetFamily,
    /// GEMM on interleaved batches, whatever the shape.
    pub gemm_interleaved: GemmConfig,
    /// GEMM on strided batches with `M` and `N` below [small_threshold](Self::small_threshold).
    pub gemm_small: GemmConfig,
    /// GEMM on other strided batches.
    pub gemm_large: GemmConfig,
    /// Bound of the small GEMM configuration, exclusive.
    pub small_threshold: usize,
    /// Tall-skinny routing, when the family benefits from it.
    pub tall_skinny: Option<TallSkinnyRule>,
    /// GEMV, non transposed or below every transposed threshold.
    pub gemv: GemvConfig,
    /// Transposed GEMV: the first entry whose minimum `M` is reached wins.
    pub gemv_transposed: &'static [(usize, GemvConfig)],
    /// GBMV.
    pub gbmv: GbmvConfig,
}

/// R-Car class accelerators.
pub static RCAR: TuningTable = TuningTable {
    family: TargetFamily::Rcar,
    gemm_interleaved: GEMM_INTERLEAVED,
    gemm_small: GEMM_SMALL,
    gemm_large: GEMM_LARGE,
    small_threshold: 512,
    tall_skinny: None,
    gemv: GEMV_DEFAULT,
    gemv_transposed: &GEMV_TRANSPOSED,
    gbmv: GBMV_DEFAULT,
};

/// Any other device.
pub static GENERIC: TuningTable = TuningTable {
    family: TargetFamily::Generic,
    gemm_interleaved: GEMM_INTERLEAVED,
    gemm_small: GEMM_SMALL,
    gemm_large: GEMM_LARGE,
    small_threshold: 512,
    tall_skinny: Some(TallSkinnyRule {
        max_dim: 64,
        depth_ratio: 16,
        config: GEMM_TALL_SKINNY,
    }),
    gemv: GEMV_DEFAULT,
    gemv_transposed: &GEMV_TRANSPOSED,
    gbmv: GBMV_DEFAULT,
};

impl TuningTable {
    /// The table of a family.
    pub fn for_family(family: TargetFamily) -> &'static TuningTable {
        match family {
            TargetFamily::Rcar => &RCAR,
            TargetFamily::Generic => &GENERIC,
        }
    }

    /// GEMM configuration of a shape.
    pub fn gemm(&self, m: usize, n: usize, batch_layout: BatchLayout) -> GemmConfig {
        match batch_layout {
            BatchLayout::Interleaved => self.gemm_interleaved,
            BatchLayout::Strided if m < self.small_threshold && n < self.small_threshold => {
                self.gemm_small
            }
            BatchLayout::Strided => self.gemm_large,
        }
    }

    /// Tall-skinny configuration of a shape, if the rule matches.
    pub fn gemm_tall_skinny(&self, m: usize, n: usize, k: usize) -> Option<GemmConfig> {
        self.tall_skinny
            .filter(|rule| rule.matches(m, n, k))
            .map(|rule| rule.config)
    }

    /// GEMV configuration of a shape.
    pub fn gemv(&self, m: usize, trans: Transpose) -> GemvConfig {
        if !trans.is_transposed() {
            return self.gemv;
        }

        self.gemv_transposed
            .iter()
            .find(|(min_rows, _)| m >= *min_rows)
            .map(|(_, config)| *config)
            .unwrap_or(self.gemv)
    }
}
