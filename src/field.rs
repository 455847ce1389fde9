// src/field.rs

use crate::collision::equilibrium;
use crate::grid::Grid3D;
use crate::lattice::VelocitySet;
use crate::site::SiteType;

static ZERO3: [f64; 3] = [0.0; 3];

/// All per-cell state of one refinement level, stored as flat contiguous buffers.
///
/// Per-direction quantities are laid out cell-major: the `nvel` populations of
/// cell `idx` occupy `f[idx * nvel .. (idx + 1) * nvel]`. Vector quantities use
/// the same scheme with stride `dims`, and the u_a·u_b averages use stride
/// `n_pairs` (upper triangle, row-major).
#[derive(Debug, Clone)]
pub struct LevelField {
    pub grid: Grid3D,
    pub nvel: usize,
    pub dims: usize,
    pub n_pairs: usize,

    pub f: Vec<f64>,
    pub feq: Vec<f64>,
    pub force_lattice: Vec<f64>,
    pub force_xyz: Vec<f64>,

    pub rho: Vec<f64>,
    pub u: Vec<f64>,

    pub rho_avg: Vec<f64>,
    pub u_avg: Vec<f64>,
    pub uu_avg: Vec<f64>,

    pub site: Vec<SiteType>,

    /// Next-generation population buffer, swapped with `f` after each sweep.
    pub(crate) f_next: Vec<f64>,
}

/// Deep copy of the evolving state of a level (everything except forcing).
#[derive(Debug, Clone)]
pub struct FieldSnapshot {
    f: Vec<f64>,
    rho: Vec<f64>,
    u: Vec<f64>,
    rho_avg: Vec<f64>,
    u_avg: Vec<f64>,
    uu_avg: Vec<f64>,
}

impl LevelField {
    /// Allocate a field of all-`Fluid` cells with every value zeroed.
    pub fn new(grid: Grid3D, vs: &VelocitySet) -> Self {
        let n = grid.n_cells();
        let nvel = vs.nvel();
        let dims = vs.dims;
        let n_pairs = vs.n_pairs();
        Self {
            grid,
            nvel,
            dims,
            n_pairs,
            f: vec![0.0; n * nvel],
            feq: vec![0.0; n * nvel],
            force_lattice: vec![0.0; n * nvel],
            force_xyz: vec![0.0; n * dims],
            rho: vec![0.0; n],
            u: vec![0.0; n * dims],
            rho_avg: vec![0.0; n],
            u_avg: vec![0.0; n * dims],
            uu_avg: vec![0.0; n * n_pairs],
            site: vec![SiteType::Fluid; n],
            f_next: vec![0.0; n * nvel],
        }
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.grid.n_cells()
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        self.grid.idx(i, j, k)
    }

    /// Flat offset of population `v` of cell `idx`.
    #[inline]
    pub fn fi(&self, idx: usize, v: usize) -> usize {
        debug_assert!(v < self.nvel);
        idx * self.nvel + v
    }

    #[inline]
    pub fn f_at(&self, i: usize, j: usize, k: usize, v: usize) -> f64 {
        self.f[self.fi(self.idx(i, j, k), v)]
    }

    #[inline]
    pub fn set_f_at(&mut self, i: usize, j: usize, k: usize, v: usize, val: f64) {
        let o = self.fi(self.idx(i, j, k), v);
        self.f[o] = val;
    }

    /// Populations of one cell.
    #[inline]
    pub fn cell_f(&self, idx: usize) -> &[f64] {
        &self.f[idx * self.nvel..(idx + 1) * self.nvel]
    }

    #[inline]
    pub fn cell_f_mut(&mut self, idx: usize) -> &mut [f64] {
        let n = self.nvel;
        &mut self.f[idx * n..(idx + 1) * n]
    }

    /// Velocity of one cell (`dims` components).
    #[inline]
    pub fn cell_u(&self, idx: usize) -> &[f64] {
        &self.u[idx * self.dims..(idx + 1) * self.dims]
    }

    /// Cartesian force of one cell (`dims` components).
    #[inline]
    pub fn cell_force(&self, idx: usize) -> &[f64] {
        &self.force_xyz[idx * self.dims..(idx + 1) * self.dims]
    }

    #[inline]
    pub fn site_at(&self, i: usize, j: usize, k: usize) -> SiteType {
        self.site[self.idx(i, j, k)]
    }

    /// Retag a cell (used by hierarchy construction and boundary set-up).
    pub fn set_site(&mut self, i: usize, j: usize, k: usize, t: SiteType) {
        let idx = self.idx(i, j, k);
        self.site[idx] = t;
    }

    /// Set every cell to the equilibrium of (`rho0`, `u0`), honouring the
    /// masked conventions for covered and solid cells.
    pub fn initialise_equilibrium(&mut self, vs: &VelocitySet, rho0: f64, u0: &[f64]) {
        let dims = self.dims;
        let nvel = self.nvel;
        for idx in 0..self.n_cells() {
            let (rho, u): (f64, &[f64]) = match self.site[idx] {
                SiteType::CoveredByFiner => (0.0, &ZERO3[..dims]),
                SiteType::Solid | SiteType::SolidVariant => (1.0, &ZERO3[..dims]),
                _ => (rho0, &u0[..dims]),
            };
            self.rho[idx] = rho;
            self.u[idx * dims..(idx + 1) * dims].copy_from_slice(u);
            for v in 0..nvel {
                let feq = equilibrium(vs, rho, u, v);
                self.f[idx * nvel + v] = feq;
                self.feq[idx * nvel + v] = feq;
            }
        }
        self.rho_avg.copy_from_slice(&self.rho);
        self.u_avg.copy_from_slice(&self.u);
        for idx in 0..self.n_cells() {
            let u = &self.u[idx * dims..(idx + 1) * dims];
            let mut p = 0;
            for a in 0..dims {
                for b in a..dims {
                    self.uu_avg[idx * self.n_pairs + p] = u[a] * u[b];
                    p += 1;
                }
            }
        }
    }

    /// Zero both force buffers.
    pub fn reset_forces(&mut self) {
        self.force_lattice.fill(0.0);
        self.force_xyz.fill(0.0);
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            f: self.f.clone(),
            rho: self.rho.clone(),
            u: self.u.clone(),
            rho_avg: self.rho_avg.clone(),
            u_avg: self.u_avg.clone(),
            uu_avg: self.uu_avg.clone(),
        }
    }

    pub fn restore(&mut self, s: &FieldSnapshot) {
        assert_eq!(s.f.len(), self.f.len(), "snapshot taken from a different level");
        self.f.copy_from_slice(&s.f);
        self.rho.copy_from_slice(&s.rho);
        self.u.copy_from_slice(&s.u);
        self.rho_avg.copy_from_slice(&s.rho_avg);
        self.u_avg.copy_from_slice(&s.u_avg);
        self.uu_avg.copy_from_slice(&s.uu_avg);
    }

    /// Σρ over cells that carry physical fluid.
    pub fn total_mass(&self) -> f64 {
        self.rho
            .iter()
            .zip(self.site.iter())
            .filter(|(_, s)| s.is_physical_fluid())
            .map(|(r, _)| *r)
            .sum()
    }

    /// Largest |u| over cells that carry physical fluid.
    pub fn max_speed(&self) -> f64 {
        let mut umax: f64 = 0.0;
        for idx in 0..self.n_cells() {
            if !self.site[idx].is_physical_fluid() {
                continue;
            }
            let u2: f64 = self.cell_u(idx).iter().map(|x| x * x).sum();
            umax = umax.max(u2.sqrt());
        }
        umax
    }

    /// Σ ρu over physical fluid cells.
    pub fn total_momentum(&self) -> [f64; 3] {
        let mut p = [0.0; 3];
        for idx in 0..self.n_cells() {
            if !self.site[idx].is_physical_fluid() {
                continue;
            }
            for (d, ud) in self.cell_u(idx).iter().enumerate() {
                p[d] += self.rho[idx] * ud;
            }
        }
        p
    }
}
