// src/grid.rs

/// Dense lattice extents for one refinement level.
///
/// Inactive axes have extent 1 (ny = nz = 1 in 1-D, nz = 1 in 2-D), so every
/// level is addressed with the same (i, j, k) triple regardless of dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Grid3D {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    #[inline]
    pub fn extent(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Convert (i, j, k) indices to a flat cell index.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        (k * self.ny + j) * self.nx + i
    }

    #[inline]
    pub fn idx_of(&self, p: [usize; 3]) -> usize {
        self.idx(p[0], p[1], p[2])
    }

    /// Inverse of [`Grid3D::idx`].
    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        debug_assert!(idx < self.n_cells());
        let i = idx % self.nx;
        let j = (idx / self.nx) % self.ny;
        let k = idx / (self.nx * self.ny);
        [i, j, k]
    }

    /// Neighbour of `p` along the lattice vector `c`, or `None` when it leaves the grid.
    #[inline]
    pub fn offset(&self, p: [usize; 3], c: [i32; 3]) -> Option<[usize; 3]> {
        let ext = self.extent();
        let mut out = [0usize; 3];
        for d in 0..3 {
            let q = p[d] as isize + c[d] as isize;
            if q < 0 || q >= ext[d] as isize {
                return None;
            }
            out[d] = q as usize;
        }
        Some(out)
    }

    /// Neighbour of `p` along `c` with every axis wrapped modulo its extent.
    #[inline]
    pub fn offset_wrapped(&self, p: [usize; 3], c: [i32; 3]) -> [usize; 3] {
        let ext = self.extent();
        let mut out = [0usize; 3];
        for d in 0..3 {
            let n = ext[d] as isize;
            out[d] = (p[d] as isize + c[d] as isize).rem_euclid(n) as usize;
        }
        out
    }
}
