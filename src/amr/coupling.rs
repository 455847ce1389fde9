// src/amr/coupling.rs
//
// Coarse/fine exchange across a 2:1 refinement interface.
//
// A coarse cell p inside region box [lo, hi) covers the 2^dims fine cells
// 2(p − lo) + {0,1} along each active axis.

use crate::amr::rect::Box3i;
use crate::field::LevelField;
use crate::site::SiteType;

/// Fine cells covered by coarse cell `p` of `region`.
pub fn fine_siblings(region: Box3i, p: [usize; 3], dims: usize) -> impl Iterator<Item = [usize; 3]> {
    debug_assert!(region.contains(p));
    (0..1usize << dims).map(move |b| {
        let mut s = [0usize; 3];
        for d in 0..dims {
            s[d] = 2 * (p[d] - region.lo[d]) + ((b >> d) & 1);
        }
        s
    })
}

/// Coarse → fine: replicate each `TransitionToCoarser` cell's populations into
/// its `TransitionReceiveFromFiner` siblings. Other siblings are left alone.
pub fn explode(parent: &LevelField, child: &mut LevelField, region: Box3i) {
    let dims = parent.dims;
    assert_eq!(parent.nvel, child.nvel, "parent and child use different velocity sets");

    for p in region.cells() {
        let pidx = parent.grid.idx_of(p);
        if parent.site[pidx] != SiteType::TransitionToCoarser {
            continue;
        }
        let src = parent.cell_f(pidx);
        for s in fine_siblings(region, p, dims) {
            let cidx = child.grid.idx_of(s);
            if child.site[cidx] == SiteType::TransitionReceiveFromFiner {
                child.cell_f_mut(cidx).copy_from_slice(src);
            }
        }
    }
}

/// Fine → coarse: every component of a `TransitionToCoarser` or `SolidVariant`
/// cell still at exactly 0 (nothing streamed into it) becomes the mean of that
/// component over the fine siblings.
pub fn coalesce(parent: &mut LevelField, child: &LevelField, region: Box3i) {
    let dims = parent.dims;
    let nvel = parent.nvel;
    let inv = 1.0 / (1usize << dims) as f64;

    for p in region.cells() {
        let pidx = parent.grid.idx_of(p);
        if !matches!(
            parent.site[pidx],
            SiteType::TransitionToCoarser | SiteType::SolidVariant
        ) {
            continue;
        }
        for v in 0..nvel {
            let o = parent.fi(pidx, v);
            if parent.f[o] != 0.0 {
                continue;
            }
            let sum: f64 = fine_siblings(region, p, dims)
                .map(|s| child.f[child.fi(child.grid.idx_of(s), v)])
                .sum();
            parent.f[o] = sum * inv;
        }
    }
}
