// src/mrt.rs
//
// Orthogonal moment basis for multiple-relaxation-time collision.
//
// Rows are polynomials in the lattice vector c evaluated at every direction:
//   D1Q3  : 1, c_x, 3c² - 2
//   D2Q9  : Lallemand & Luo (2000) ordering
//           ρ, e, ε, j_x, q_x, j_y, q_y, p_xx, p_xy
//   D3Q19 : d'Humières et al. (2002) ordering
//           ρ, e, ε, j_x, q_x, j_y, q_y, j_z, q_z,
//           3p_xx, 3π_xx, p_ww, π_ww, p_xy, p_yz, p_xz, m_x, m_y, m_z
//
// The rows are mutually orthogonal, so M⁻¹ = Mᵀ · diag(1 / |row|²).

use crate::lattice::{LatticeKind, VelocitySet};

/// Forward transform M (row-major, nvel × nvel) and its inverse.
#[derive(Debug, Clone)]
pub struct MomentBasis {
    pub n: usize,
    pub m: Vec<f64>,
    pub m_inv: Vec<f64>,
}

fn moment_row(kind: LatticeKind, row: usize, c: [i32; 3]) -> f64 {
    let x = c[0] as f64;
    let y = c[1] as f64;
    let z = c[2] as f64;
    let c2 = x * x + y * y + z * z;
    match kind {
        LatticeKind::D1Q3 => match row {
            0 => 1.0,
            1 => x,
            2 => 3.0 * x * x - 2.0,
            _ => unreachable!("D1Q3 has 3 moments"),
        },
        LatticeKind::D2Q9 => match row {
            0 => 1.0,
            1 => 3.0 * c2 - 4.0,
            2 => 0.5 * (9.0 * c2 * c2 - 21.0 * c2 + 8.0),
            3 => x,
            4 => (3.0 * c2 - 5.0) * x,
            5 => y,
            6 => (3.0 * c2 - 5.0) * y,
            7 => x * x - y * y,
            8 => x * y,
            _ => unreachable!("D2Q9 has 9 moments"),
        },
        LatticeKind::D3Q19 => match row {
            0 => 1.0,
            1 => 19.0 * c2 - 30.0,
            2 => 0.5 * (21.0 * c2 * c2 - 53.0 * c2 + 24.0),
            3 => x,
            4 => (5.0 * c2 - 9.0) * x,
            5 => y,
            6 => (5.0 * c2 - 9.0) * y,
            7 => z,
            8 => (5.0 * c2 - 9.0) * z,
            9 => 3.0 * x * x - c2,
            10 => (3.0 * c2 - 5.0) * (3.0 * x * x - c2),
            11 => y * y - z * z,
            12 => (3.0 * c2 - 5.0) * (y * y - z * z),
            13 => x * y,
            14 => y * z,
            15 => x * z,
            16 => (y * y - z * z) * x,
            17 => (z * z - x * x) * y,
            18 => (x * x - y * y) * z,
            _ => unreachable!("D3Q19 has 19 moments"),
        },
    }
}

impl MomentBasis {
    pub fn new(vs: &VelocitySet) -> Self {
        let n = vs.nvel();
        let mut m = vec![0.0; n * n];
        for p in 0..n {
            for q in 0..n {
                m[p * n + q] = moment_row(vs.kind, p, vs.c[q]);
            }
        }

        let norms: Vec<f64> = (0..n)
            .map(|p| (0..n).map(|q| m[p * n + q] * m[p * n + q]).sum())
            .collect();

        let mut m_inv = vec![0.0; n * n];
        for p in 0..n {
            for q in 0..n {
                m_inv[p * n + q] = m[q * n + p] / norms[q];
            }
        }

        Self { n, m, m_inv }
    }

    /// out = M · f
    #[inline]
    pub fn forward(&self, f: &[f64], out: &mut [f64]) {
        mat_vec(&self.m, self.n, f, out);
    }

    /// out = M⁻¹ · m
    #[inline]
    pub fn inverse(&self, m: &[f64], out: &mut [f64]) {
        mat_vec(&self.m_inv, self.n, m, out);
    }
}

#[inline]
fn mat_vec(a: &[f64], n: usize, x: &[f64], out: &mut [f64]) {
    debug_assert!(x.len() == n && out.len() == n);
    for p in 0..n {
        let row = &a[p * n..(p + 1) * n];
        out[p] = row.iter().zip(x.iter()).map(|(r, xv)| r * xv).sum();
    }
}
