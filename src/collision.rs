// src/collision.rs

use rayon::prelude::*;

use crate::field::LevelField;
use crate::lattice::VelocitySet;
use crate::mrt::MomentBasis;
use crate::params::{CollisionOperator, LbmParams, LevelRelaxation};

/// Largest direction count of the supported velocity sets (D3Q19).
pub const MAX_VELS: usize = 19;

/// Second-order equilibrium
///
///   feq_v = ρ w_v (1 + A/cs² + B/(2cs⁴)),
///   A = c_v·u,  B = Σ_ab (c_va c_vb − cs² δ_ab) u_a u_b.
#[inline]
pub fn equilibrium(vs: &VelocitySet, rho: f64, u: &[f64], v: usize) -> f64 {
    let cv = vs.c[v];
    let cs2 = vs.cs2;
    let a = vs.c_dot(v, u);
    let mut b = 0.0;
    for p in 0..vs.dims {
        for q in 0..vs.dims {
            let delta = if p == q { cs2 } else { 0.0 };
            b += ((cv[p] * cv[q]) as f64 - delta) * u[p] * u[q];
        }
    }
    rho * vs.w[v] * (1.0 + a / cs2 + b / (2.0 * cs2 * cs2))
}

#[inline]
fn bgk_cell(f: &[f64], feq: &[f64], force: &[f64], omega: f64, out: &mut [f64]) {
    for v in 0..f.len() {
        out[v] = f[v] - omega * (f[v] - feq[v]) + force[v];
    }
}

#[inline]
fn mrt_cell(
    basis: &MomentBasis,
    rates: &[f64],
    f: &[f64],
    feq: &[f64],
    force: &[f64],
    out: &mut [f64],
) {
    let n = f.len();
    let mut m = [0.0; MAX_VELS];
    let mut meq = [0.0; MAX_VELS];
    basis.forward(f, &mut m[..n]);
    basis.forward(feq, &mut meq[..n]);
    for q in 0..n {
        m[q] -= rates[q] * (m[q] - meq[q]);
    }
    basis.inverse(&m[..n], out);
    for v in 0..n {
        out[v] += force[v];
    }
}

/// Relax every collidable cell towards equilibrium.
///
/// Reads the pre-sweep f, ρ, u and lattice forces and writes the new
/// generation through the level's scratch buffer. Cells that do not collide
/// (covered by a finer level, or filled by explode) keep their populations.
/// `feq` is refreshed for every collidable cell as a side product.
pub fn collide(field: &mut LevelField, params: &LbmParams, relax: &LevelRelaxation) {
    let vs = &params.velocities;
    let nvel = field.nvel;
    let dims = field.dims;
    let omega = relax.omega;

    let LevelField {
        f,
        feq,
        f_next,
        force_lattice,
        u,
        rho,
        site,
        ..
    } = field;

    f_next.copy_from_slice(f);

    let f_old: &[f64] = f;
    let u: &[f64] = u;
    let rho: &[f64] = rho;
    let force: &[f64] = force_lattice;
    let site: &[crate::site::SiteType] = site;

    let mrt = match &params.collision {
        CollisionOperator::Bgk => None,
        CollisionOperator::Mrt(basis) => {
            debug_assert!(relax.mrt_rates.is_some(), "MRT level without relaxation rates");
            relax.mrt_rates.as_deref().map(|rates| (basis, rates))
        }
    };

    f_next
        .par_chunks_mut(nvel)
        .zip(feq.par_chunks_mut(nvel))
        .enumerate()
        .for_each(|(idx, (out, feq_cell))| {
            if !site[idx].collides() {
                return;
            }
            let u_cell = &u[idx * dims..(idx + 1) * dims];
            for (v, e) in feq_cell.iter_mut().enumerate() {
                *e = equilibrium(vs, rho[idx], u_cell, v);
            }
            let f_cell = &f_old[idx * nvel..(idx + 1) * nvel];
            let force_cell = &force[idx * nvel..(idx + 1) * nvel];
            match mrt {
                None => bgk_cell(f_cell, feq_cell, force_cell, omega, out),
                Some((basis, rates)) => mrt_cell(basis, rates, f_cell, feq_cell, force_cell, out),
            }
        });

    std::mem::swap(f, f_next);
}
