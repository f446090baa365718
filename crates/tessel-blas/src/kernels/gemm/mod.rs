mod access;
mod stage;

use access::MatrixAccess;
use stage::{TileLoad, stage_tile};
use tessel_runtime::{Buffer, Grid, Kernel, LaunchError, LocalMemory, NdRange, WorkgroupId};

use crate::{
    Element,
    config::{BatchLayout, GemmAlgorithm, GemmConfig, GemmMemory, JOINT_MATRIX_DEPTH},
    operation::{Gemm, GemmPartial, GemmProblem},
};

const MAX_VECTOR_SIZE: usize = 16;

/// Where a tiled GEMM writes its block accumulators.
#[derive(Debug)]
enum GemmTarget<E: Element> {
    /// `C := alpha * acc + beta * C`, C is never read when `beta_zero`.
    Output { c: Buffer<E>, beta_zero: bool },
    /// Raw accumulators, one matrix per depth slice.
    Partials {
        scratch: Buffer<E>,
        num_partials: usize,
    },
}

/// Output block of one workgroup.
#[derive(Clone, Copy, Debug)]
struct Block {
    row: usize,
    col: usize,
    /// Batch of a strided block, first batch of an interleaved block.
    batch: usize,
    part: usize,
    k_begin: usize,
    k_end: usize,
}

/// Every GEMM variant, built from the tile shape and strategies of its configuration.
///
/// A workgroup computes a `block_rows × block_cols` block of the output (times the block batches
/// for interleaved batches). Work item `(tr, tc)` owns rows `tr + i * wg_rows` and columns
/// `tc + j * wg_cols` of the block.
#[derive(Debug)]
pub(crate) struct TiledGemmKernel<E: Element> {
    name: &'static str,
    config: GemmConfig,
    problem: GemmProblem,
    alpha: E,
    beta: E,
    a: Buffer<E>,
    b: Buffer<E>,
    target: GemmTarget<E>,
}

impl<E: Element> TiledGemmKernel<E> {
    pub(crate) fn new(gemm: &Gemm<'_, E>) -> Self {
        let config = gemm.config;
        let name = match (config.batch_layout, config.algorithm, config.memory) {
            (BatchLayout::Interleaved, _, _) => "gemm_interleaved",
            (_, GemmAlgorithm::JointMatrix, _) => "gemm_joint_matrix",
            (_, _, GemmMemory::NoLocal) => "gemm_no_local",
            (_, _, GemmMemory::Local) if config.double_buffer => "gemm_local_double_buffer",
            (_, _, GemmMemory::Local) => "gemm_local",
        };

        Self {
            name,
            config,
            problem: gemm.problem,
            alpha: gemm.alpha,
            beta: gemm.beta,
            a: gemm.a.clone(),
            b: gemm.b.clone(),
            target: GemmTarget::Output {
                c: gemm.c.clone(),
                beta_zero: gemm.beta_zero(),
            },
        }
    }

    pub(crate) fn partial(partial: &GemmPartial<'_, E>) -> Self {
        Self {
            name: "gemm_partial",
            config: partial.config,
            problem: partial.problem,
            alpha: E::one(),
            beta: E::zero(),
            a: partial.a.clone(),
            b: partial.b.clone(),
            target: GemmTarget::Partials {
                scratch: partial.scratch.clone(),
                num_partials: partial.num_partials,
            },
        }
    }

    fn num_partials(&self) -> usize {
        match &self.target {
            GemmTarget::Output { .. } => 1,
            GemmTarget::Partials { num_partials, .. } => *num_partials,
        }
    }

    fn target_buffer(&self) -> &Buffer<E> {
        match &self.target {
            GemmTarget::Output { c, .. } => c,
            GemmTarget::Partials { scratch, .. } => scratch,
        }
    }

    fn block_shape(&self) -> (usize, usize, usize) {
        let tile = &self.config.tile;
        let batches = match self.config.batch_layout {
            BatchLayout::Strided => 1,
            BatchLayout::Interleaved => tile.block_batches(),
        };
        (tile.block_rows(), tile.block_cols(), batches)
    }

    fn block(&self, group: WorkgroupId) -> Block {
        let (bm, bn, bb) = self.block_shape();
        let partials = self.num_partials();
        let z = group.z as usize;
        let (batch, part) = match self.config.batch_layout {
            BatchLayout::Strided => (z / partials, z % partials),
            BatchLayout::Interleaved => (z * bb, 0),
        };
        let k = self.problem.k;
        let chunk = k.div_ceil(partials);
        let k_begin = (part * chunk).min(k);

        Block {
            row: group.x as usize * bm,
            col: group.y as usize * bn,
            batch,
            part,
            k_begin,
            k_end: (k_begin + chunk).min(k),
        }
    }

    fn is_interior(&self, block: &Block) -> bool {
        let (bm, bn, bb) = self.block_shape();
        block.row + bm <= self.problem.m
            && block.col + bn <= self.problem.n
            && block.batch + bb <= self.problem.batch_size
    }

    fn local(&self, block: &Block, local: &mut LocalMemory, a: &[E], b: &[E], acc: &mut [E]) {
        let depth = self.config.block_depth::<E>();
        let slice_len = self.config.staged_slice_len::<E>();
        let memory = local.view::<E>();
        let split = slice_len.min(memory.len());
        let (front, back) = memory.split_at_mut(split);
        let slices: Vec<usize> = (block.k_begin..block.k_end).step_by(depth).collect();

        if !self.config.double_buffer {
            for k in slices {
                self.stage(block, k, front, a, b);
                self.multiply(front, (block.k_end - k).min(depth), acc);
            }
            return;
        }

        let (mut current, mut next) = (front, back);
        if let Some(first) = slices.first() {
            self.stage(block, *first, current, a, b);
        }
        for (index, k) in slices.iter().enumerate() {
            if let Some(k_next) = slices.get(index + 1) {
                self.stage(block, *k_next, next, a, b);
            }
            self.multiply(current, (block.k_end - k).min(depth), acc);
            core::mem::swap(&mut current, &mut next);
        }
    }

    fn stage(&self, block: &Block, k: usize, buffer: &mut [E], a: &[E], b: &[E]) {
        let (bm, bn, _) = self.block_shape();
        let depth = self.config.block_depth::<E>();
        let a_ld = self.config.tile_a_ld();
        let b_ld = self.config.tile_b_ld::<E>();
        let width = self.config.load_width(self.is_interior(block));
        let workgroup_size = self.config.workgroup_size as usize;
        let (tile_a, tile_b) = buffer.split_at_mut(a_ld * depth);

        let load_a = TileLoad {
            origin: (block.row, k),
            extent: (bm, depth),
            limit: (self.problem.m, block.k_end),
            batch: block.batch,
            width,
            workgroup_size,
        };
        stage_tile(a, &MatrixAccess::lhs(&self.problem), &load_a, tile_a, a_ld);

        let load_b = TileLoad {
            origin: (k, block.col),
            extent: (depth, bn),
            limit: (block.k_end, self.problem.n),
            ..load_a
        };
        stage_tile(b, &MatrixAccess::rhs(&self.problem), &load_b, tile_b, b_ld);
    }

    /// Accumulate the product of the staged tiles over `depth` elements.
    fn multiply(&self, buffer: &[E], depth: usize, acc: &mut [E]) {
        let tile = &self.config.tile;
        let (bm, bn, _) = self.block_shape();
        let a_ld = self.config.tile_a_ld();
        let b_ld = self.config.tile_b_ld::<E>();
        let (tile_a, tile_b) = buffer.split_at(a_ld * self.config.block_depth::<E>());

        if self.config.algorithm == GemmAlgorithm::JointMatrix {
            let (frag_rows, frag_cols) = (tile.tl_rows as usize, tile.tl_cols as usize);

            for fc in (0..bn).step_by(frag_cols) {
                for fr in (0..bm).step_by(frag_rows) {
                    for k in (0..depth).step_by(JOINT_MATRIX_DEPTH) {
                        let k_end = (k + JOINT_MATRIX_DEPTH).min(depth);
                        for c in fc..fc + frag_cols {
                            for r in fr..fr + frag_rows {
                                let mut sum = E::zero();
                                for kk in k..k_end {
                                    sum = sum + tile_a[r + kk * a_ld] * tile_b[kk + c * b_ld];
                                }
                                acc[r + c * bm] = acc[r + c * bm] + sum;
                            }
                        }
                    }
                }
            }
            return;
        }

        let (wr, wc) = (tile.wg_rows as usize, tile.wg_cols as usize);
        for item in 0..wr * wc {
            let (tr, tc) = (item % wr, item / wr);
            for kk in 0..depth {
                for i in 0..tile.item_rows as usize {
                    let r = tr + i * wr;
                    let lhs = tile_a[r + kk * a_ld];
                    for j in 0..tile.item_cols as usize {
                        let c = tc + j * wc;
                        acc[r + c * bm] = acc[r + c * bm] + lhs * tile_b[kk + c * b_ld];
                    }
                }
            }
        }
    }

    fn no_local(&self, block: &Block, a: &[E], b: &[E], acc: &mut [E]) {
        let tile = &self.config.tile;
        let (bm, _, _) = self.block_shape();
        let (wr, wc) = (tile.wg_rows as usize, tile.wg_cols as usize);
        let width = self
            .config
            .load_width(self.is_interior(block))
            .min(MAX_VECTOR_SIZE);
        let lhs = MatrixAccess::lhs(&self.problem);
        let rhs = MatrixAccess::rhs(&self.problem);

        for item in 0..wr * wc {
            let (tr, tc) = (item % wr, item / wr);
            for i in 0..tile.item_rows as usize {
                let r = tr + i * wr;
                let row = block.row + r;
                if row >= self.problem.m {
                    continue;
                }

                for j in 0..tile.item_cols as usize {
                    let c = tc + j * wc;
                    let col = block.col + c;
                    if col >= self.problem.n {
                        continue;
                    }

                    let mut sum = E::zero();
                    for k in (block.k_begin..block.k_end).step_by(width) {
                        let len = width.min(block.k_end - k);
                        let mut lhs_vec = [E::zero(); MAX_VECTOR_SIZE];
                        let mut rhs_vec = [E::zero(); MAX_VECTOR_SIZE];
                        for v in 0..len {
                            lhs_vec[v] = a[lhs.offset(block.batch, row, k + v)];
                            rhs_vec[v] = b[rhs.offset(block.batch, k + v, col)];
                        }
                        for v in 0..len {
                            sum = sum + lhs_vec[v] * rhs_vec[v];
                        }
                    }
                    acc[r + c * bm] = sum;
                }
            }
        }
    }

    /// Interleaved batches, vector loads run along the batch dimension.
    fn interleaved(&self, block: &Block, a: &[E], b: &[E], acc: &mut [E]) {
        let tile = &self.config.tile;
        let (bm, _, bb) = self.block_shape();
        let (wr, wc, wb) = (
            tile.wg_rows as usize,
            tile.wg_cols as usize,
            tile.wg_batches as usize,
        );
        let item_batches = tile.item_batches as usize;
        let width = self
            .config
            .load_width(self.is_interior(block))
            .min(MAX_VECTOR_SIZE);
        let lhs = MatrixAccess::lhs(&self.problem);
        let rhs = MatrixAccess::rhs(&self.problem);

        for item in 0..wr * wc * wb {
            let (tr, tc, tb) = (item % wr, (item / wr) % wc, item / (wr * wc));
            for i in 0..tile.item_rows as usize {
                let r = tr + i * wr;
                let row = block.row + r;
                if row >= self.problem.m {
                    continue;
                }

                for j in 0..tile.item_cols as usize {
                    let c = tc + j * wc;
                    let col = block.col + c;
                    if col >= self.problem.n {
                        continue;
                    }

                    for first in (0..item_batches).step_by(width) {
                        let lb = tb * item_batches + first;
                        let batch = block.batch + lb;
                        if batch >= self.problem.batch_size {
                            break;
                        }
                        let len = width
                            .min(item_batches - first)
                            .min(self.problem.batch_size - batch);

                        let mut sums = [E::zero(); MAX_VECTOR_SIZE];
                        for k in block.k_begin..block.k_end {
                            let a_offset = lhs.offset(batch, row, k);
                            let b_offset = rhs.offset(batch, k, col);
                            for v in 0..len {
                                sums[v] = sums[v] + a[a_offset + v] * b[b_offset + v];
                            }
                        }
                        for v in 0..len {
                            acc[(r + c * bm) * bb + lb + v] = sums[v];
                        }
                    }
                }
            }
        }
    }

    fn store(&self, block: &Block, acc: &[E], out: &mut [E]) {
        let (bm, bn, bb) = self.block_shape();
        let problem = &self.problem;
        let rows = bm.min(problem.m.saturating_sub(block.row));
        let cols = bn.min(problem.n.saturating_sub(block.col));
        let batches = bb.min(problem.batch_size.saturating_sub(block.batch));

        match &self.target {
            GemmTarget::Output { beta_zero, .. } => {
                let access = MatrixAccess::output(problem);
                for lb in 0..batches {
                    for c in 0..cols {
                        for r in 0..rows {
                            let offset =
                                access.offset(block.batch + lb, block.row + r, block.col + c);
                            let value = self.alpha * acc[(r + c * bm) * bb + lb];
                            out[offset] = match *beta_zero {
                                true => value,
                                false => value + self.beta * out[offset],
                            };
                        }
                    }
                }
            }
            GemmTarget::Partials { num_partials, .. } => {
                let matrix = problem.m * problem.n;
                let base = (block.part + block.batch * num_partials) * matrix;
                for c in 0..cols {
                    for r in 0..rows {
                        let offset = base + block.row + r + (block.col + c) * problem.m;
                        out[offset] = acc[r + c * bm];
                    }
                }
            }
        }
    }
}

impl<E: Element> Kernel for TiledGemmKernel<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn range(&self) -> NdRange {
        let tile = &self.config.tile;
        let (bm, bn, bb) = self.block_shape();
        let groups_x = self.problem.m.div_ceil(bm) as u32;
        let groups_y = self.problem.n.div_ceil(bn) as u32;

        match self.config.batch_layout {
            BatchLayout::Strided => NdRange::groups_3d(
                [
                    groups_x,
                    groups_y,
                    (self.problem.batch_size * self.num_partials()) as u32,
                ],
                [tile.wg_rows, tile.wg_cols, 1],
            ),
            BatchLayout::Interleaved => NdRange::groups_3d(
                [
                    groups_x,
                    groups_y,
                    self.problem.batch_size.div_ceil(bb) as u32,
                ],
                [tile.wg_rows, tile.wg_cols, tile.wg_batches],
            ),
        }
    }

    fn local_memory_size(&self) -> usize {
        self.config.local_memory_size::<E>()
    }

    fn execute(&self, grid: &mut Grid<'_>) -> Result<(), LaunchError> {
        let a = self.a.read();
        let b = self.b.read();
        let mut out = self.target_buffer().write();
        let (bm, bn, bb) = self.block_shape();
        let mut acc = vec![E::zero(); bm * bn * bb];

        grid.for_each_group(|group, local| {
            acc.fill(E::zero());
            let block = self.block(group);

            match (self.config.batch_layout, self.config.memory) {
                (BatchLayout::Interleaved, _) => self.interleaved(&block, &a, &b, &mut acc),
                (_, GemmMemory::NoLocal) => self.no_local(&block, &a, &b, &mut acc),
                (_, GemmMemory::Local) => self.local(&block, local, &a, &b, &mut acc),
            }

            self.store(&block, &acc, &mut out);
            Ok(())
        })
    }
}
