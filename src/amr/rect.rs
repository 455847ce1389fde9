// src/amr/rect.rs

/// Integer box in (i,j,k) index space, using half-open intervals:
/// [lo[0], hi[0]) × [lo[1], hi[1]) × [lo[2], hi[2])
///
/// Refined regions are given as boxes in the *parent* level's cell indices.
/// Inactive axes of 1-D/2-D lattices span [0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Box3i {
    pub lo: [usize; 3],
    pub hi: [usize; 3],
}

impl Box3i {
    #[inline]
    pub fn new(lo: [usize; 3], hi: [usize; 3]) -> Self {
        Self { lo, hi }
    }

    /// Whole grid of the given extents.
    #[inline]
    pub fn covering(extent: [usize; 3]) -> Self {
        Self::new([0; 3], extent)
    }

    /// Number of cells along each axis (0 for inverted axes).
    #[inline]
    pub fn size(self) -> [usize; 3] {
        [
            self.hi[0].saturating_sub(self.lo[0]),
            self.hi[1].saturating_sub(self.lo[1]),
            self.hi[2].saturating_sub(self.lo[2]),
        ]
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size().contains(&0)
    }

    #[inline]
    pub fn n_cells(self) -> usize {
        let s = self.size();
        s[0] * s[1] * s[2]
    }

    /// Returns true if this box is fully contained within a grid of the given extents.
    #[inline]
    pub fn fits_in(self, extent: [usize; 3]) -> bool {
        (0..3).all(|d| self.lo[d] <= self.hi[d] && self.hi[d] <= extent[d])
    }

    #[inline]
    pub fn contains(self, p: [usize; 3]) -> bool {
        (0..3).all(|d| p[d] >= self.lo[d] && p[d] < self.hi[d])
    }

    #[inline]
    pub fn contains_box(self, other: Box3i) -> bool {
        (0..3).all(|d| other.lo[d] >= self.lo[d] && other.hi[d] <= self.hi[d])
    }

    /// `p` (inside the box) touches a face of the box along one of the first `dims` axes.
    #[inline]
    pub fn on_rim(self, p: [usize; 3], dims: usize) -> bool {
        debug_assert!(self.contains(p));
        (0..dims).any(|d| p[d] == self.lo[d] || p[d] + 1 == self.hi[d])
    }

    /// Intersection of two boxes.
    pub fn intersect(self, other: Box3i) -> Option<Box3i> {
        let mut lo = [0; 3];
        let mut hi = [0; 3];
        for d in 0..3 {
            lo[d] = self.lo[d].max(other.lo[d]);
            hi[d] = self.hi[d].min(other.hi[d]);
            if hi[d] <= lo[d] {
                return None;
            }
        }
        Some(Box3i::new(lo, hi))
    }

    /// Shrink by `pad` cells on both sides of the first `dims` axes.
    ///
    /// Axes thinner than `2 * pad` collapse to an empty interval.
    pub fn shrink(self, pad: usize, dims: usize) -> Box3i {
        let mut out = self;
        for d in 0..dims {
            out.lo[d] = self.lo[d] + pad;
            out.hi[d] = self.hi[d].saturating_sub(pad).max(out.lo[d]);
        }
        out
    }

    /// Iterate the cells of the box in the same (x fastest) order as flat indices.
    pub fn cells(self) -> impl Iterator<Item = [usize; 3]> {
        let Box3i { lo, hi } = self;
        (lo[2]..hi[2]).flat_map(move |k| {
            (lo[1]..hi[1]).flat_map(move |j| (lo[0]..hi[0]).map(move |i| [i, j, k]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rim_and_interior_partition_a_box() {
        let b = Box3i::new([2, 3, 0], [6, 6, 1]);
        let rim = b.cells().filter(|&p| b.on_rim(p, 2)).count();
        assert_eq!(b.n_cells(), 12);
        // 4x3 box: interior is 2x1.
        assert_eq!(rim, 10);
        assert_eq!(b.shrink(1, 2).n_cells(), 2);
    }

    #[test]
    fn intersect_and_containment() {
        let a = Box3i::new([0, 0, 0], [4, 4, 1]);
        let b = Box3i::new([3, 2, 0], [8, 3, 1]);
        assert_eq!(a.intersect(b), Some(Box3i::new([3, 2, 0], [4, 3, 1])));
        let c = Box3i::new([4, 0, 0], [5, 4, 1]);
        assert_eq!(a.intersect(c), None);
        assert!(a.fits_in([4, 4, 1]));
        assert!(!b.fits_in([7, 4, 1]));
        assert!(Box3i::covering([8, 8, 1]).contains_box(b));
        assert!(Box3i::new([1, 1, 0], [1, 3, 1]).is_empty());
    }

    #[test]
    fn cells_follow_flat_index_order() {
        let b = Box3i::new([1, 0, 0], [3, 2, 1]);
        let cells: Vec<_> = b.cells().collect();
        assert_eq!(cells, vec![[1, 0, 0], [2, 0, 0], [1, 1, 0], [2, 1, 0]]);
    }
}
