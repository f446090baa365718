use super::access::MatrixAccess;
use crate::Element;

/// Region of `op(X)` copied into local memory by a workgroup.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TileLoad {
    /// First `(row, col)` of the region.
    pub origin: (usize, usize),
    /// `(rows, cols)` of the region.
    pub extent: (usize, usize),
    /// Coordinates at and past these bounds are zero filled.
    pub limit: (usize, usize),
    pub batch: usize,
    /// Elements loaded at once along the contiguous dimension.
    pub width: usize,
    pub workgroup_size: usize,
}

/// Cooperatively copy a region into a column-major local tile of leading dimension `dst_ld`.
///
/// Work items take load units round robin. A unit is `width` elements along the contiguous
/// dimension of the source, copied at once when fully in bounds and element by element
/// otherwise.
pub(crate) fn stage_tile<E: Element>(
    src: &[E],
    access: &MatrixAccess,
    load: &TileLoad,
    dst: &mut [E],
    dst_ld: usize,
) {
    let (rows, cols) = load.extent;
    let along_rows = access.rows_contiguous();
    let width = match along_rows || access.cols_contiguous() {
        true => load.width.max(1),
        false => 1,
    };
    let (fast, slow) = match along_rows {
        true => (rows, cols),
        false => (cols, rows),
    };
    let vectors = fast.div_ceil(width);
    let units = vectors * slow;
    let local = |first: usize, slow: usize, e: usize| match along_rows {
        true => (first + e, slow),
        false => (slow, first + e),
    };

    for item in 0..load.workgroup_size {
        for unit in (item..units).step_by(load.workgroup_size) {
            let first = (unit % vectors) * width;
            let len = width.min(fast - first);
            let (row, col) = local(first, unit / vectors, 0);
            let (row, col) = (load.origin.0 + row, load.origin.1 + col);
            let in_bounds = match along_rows {
                true => row + len <= load.limit.0 && col < load.limit.1,
                false => row < load.limit.0 && col + len <= load.limit.1,
            };

            if in_bounds && len == width && width > 1 {
                let offset = access.offset(load.batch, row, col);
                for (e, value) in src[offset..offset + width].iter().enumerate() {
                    let (lr, lc) = local(first, unit / vectors, e);
                    dst[lr + lc * dst_ld] = *value;
                }
                continue;
            }

            for e in 0..len {
                let (lr, lc) = local(first, unit / vectors, e);
                let (row, col) = (load.origin.0 + lr, load.origin.1 + lc);
                dst[lr + lc * dst_ld] = match row < load.limit.0 && col < load.limit.1 {
                    true => src[access.offset(load.batch, row, col)],
                    false => E::zero(),
                };
            }
        }
    }
}
