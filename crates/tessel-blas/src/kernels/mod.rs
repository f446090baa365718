mod assign_reduction;
mod gbmv;
mod gemm;
mod gemv;
mod reduction;
mod vector;

pub(crate) use assign_reduction::*;
pub(crate) use gbmv::*;
pub(crate) use gemm::*;
pub(crate) use gemv::*;
pub(crate) use reduction::*;
pub(crate) use vector::*;

use tessel_runtime::NdRange;

/// Fold `len` slots pairwise into slot 0, halving the active work items at each step.
///
/// `merge(target, source)` folds slot `source` into slot `target`.
pub(crate) fn tree_reduce(len: usize, mut merge: impl FnMut(usize, usize)) {
    let mut active = len;

    while active > 1 {
        let half = active.div_ceil(2);
        for item in 0..active - half {
            merge(item, item + half);
        }
        active = half;
    }
}

/// One work item per element, in whole workgroups, at least one workgroup.
pub(crate) fn linear_range(items: usize, workgroup_size: u32) -> NdRange {
    let groups = items.div_ceil(workgroup_size.max(1) as usize).max(1);
    NdRange::groups_1d(groups as u32, workgroup_size)
}

/// Work items of a linear launch and the id of item `item` of workgroup `group`.
pub(crate) fn linear_ids(range: &NdRange, group: u32) -> impl Iterator<Item = (usize, usize)> {
    let local = range.local[0] as usize;
    let first = group as usize * local;
    (0..local).map(move |item| (item, first + item))
}
