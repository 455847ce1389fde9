// src/macroscopic.rs
//
// Density/velocity recovery with the half-step force correction, plus the
// running time-averages of ρ, u and u_a·u_b.

use rayon::prelude::*;

use crate::field::LevelField;
use crate::lattice::VelocitySet;
use crate::params::{level_dt, LbmParams};
use crate::site::SiteType;

/// Incremental mean after `t` previous samples: (avg·t + x)/(t + 1).
#[inline]
pub fn running_mean(avg: f64, t: u64, x: f64) -> f64 {
    let t = t as f64;
    (avg * t + x) / (t + 1.0)
}

/// ρ and u of one cell from its populations and Cartesian force.
#[inline]
fn recover_cell(
    vs: &VelocitySet,
    site: SiteType,
    f: &[f64],
    force: &[f64],
    half_dt: f64,
    u: &mut [f64],
) -> f64 {
    match site {
        SiteType::CoveredByFiner => {
            u.fill(0.0);
            0.0
        }
        SiteType::Solid | SiteType::SolidVariant => {
            u.fill(0.0);
            1.0
        }
        _ => {
            let rho: f64 = f.iter().sum();
            for (d, ud) in u.iter_mut().enumerate() {
                let mut p = 0.0;
                for (v, fv) in f.iter().enumerate() {
                    p += vs.c[v][d] as f64 * fv;
                }
                p += rho * half_dt * force[d];
                *ud = p / rho;
            }
            rho
        }
    }
}

/// Recover ρ, u at every cell and fold them into the time-averages.
///
/// `t` is the level's tick count before this tick completes, i.e. the
/// number of samples already in the averages.
pub fn update_macroscopic(field: &mut LevelField, params: &LbmParams, level: usize, t: u64) {
    let vs = &params.velocities;
    let nvel = field.nvel;
    let dims = field.dims;
    let n_pairs = field.n_pairs;
    let half_dt = 0.5 * level_dt(level);

    let LevelField {
        f,
        force_xyz,
        rho,
        u,
        rho_avg,
        u_avg,
        uu_avg,
        site,
        ..
    } = field;
    let f: &[f64] = f;
    let force: &[f64] = force_xyz;
    let site: &[SiteType] = site;

    rho.par_iter_mut()
        .zip(u.par_chunks_mut(dims))
        .zip(rho_avg.par_iter_mut())
        .zip(u_avg.par_chunks_mut(dims))
        .zip(uu_avg.par_chunks_mut(n_pairs))
        .enumerate()
        .for_each(|(idx, ((((rho, u), rho_avg), u_avg), uu_avg))| {
            *rho = recover_cell(
                vs,
                site[idx],
                &f[idx * nvel..(idx + 1) * nvel],
                &force[idx * dims..(idx + 1) * dims],
                half_dt,
                u,
            );

            *rho_avg = running_mean(*rho_avg, t, *rho);
            for d in 0..dims {
                u_avg[d] = running_mean(u_avg[d], t, u[d]);
            }
            let mut p = 0;
            for a in 0..dims {
                for b in a..dims {
                    uu_avg[p] = running_mean(uu_avg[p], t, u[a] * u[b]);
                    p += 1;
                }
            }
        });
}

/// Recompute ρ, u of a single cell without touching the time-averages.
///
/// Meant for halo cells whose populations were just refreshed by the
/// exchange layer, never for use inside the bulk sweep.
pub fn update_site(field: &mut LevelField, params: &LbmParams, level: usize, idx: usize) {
    let nvel = field.nvel;
    let dims = field.dims;
    let half_dt = 0.5 * level_dt(level);

    let LevelField {
        f,
        force_xyz,
        rho,
        u,
        site,
        ..
    } = field;
    rho[idx] = recover_cell(
        &params.velocities,
        site[idx],
        &f[idx * nvel..(idx + 1) * nvel],
        &force_xyz[idx * dims..(idx + 1) * dims],
        half_dt,
        &mut u[idx * dims..(idx + 1) * dims],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3D;
    use crate::lattice::LatticeKind;
    use crate::params::CollisionOperator;
    use approx::assert_relative_eq;

    fn params() -> LbmParams {
        LbmParams {
            velocities: VelocitySet::new(LatticeKind::D2Q9),
            collision: CollisionOperator::Bgk,
            periodic: true,
            gravity: None,
        }
    }

    #[test]
    fn running_mean_of_a_constant_is_the_constant() {
        for x in [0.0, 1.0, -3.25, 1e-9] {
            let mut avg = 0.0;
            for t in 0..1000 {
                avg = running_mean(avg, t, x);
                assert_relative_eq!(avg, x, epsilon = 1e-15, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn running_mean_matches_full_average() {
        let xs: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut avg = 0.0;
        for (t, &x) in xs.iter().enumerate() {
            avg = running_mean(avg, t as u64, x);
        }
        let full = xs.iter().sum::<f64>() / xs.len() as f64;
        assert_relative_eq!(avg, full, epsilon = 1e-14);
    }

    #[test]
    fn masked_cells_ignore_their_populations() {
        let p = params();
        let mut field = LevelField::new(Grid3D::new(3, 1, 1), &p.velocities);
        field.set_site(0, 0, 0, SiteType::Solid);
        field.set_site(1, 0, 0, SiteType::SolidVariant);
        field.set_site(2, 0, 0, SiteType::CoveredByFiner);
        for idx in 0..3 {
            for (v, x) in field.cell_f_mut(idx).iter_mut().enumerate() {
                *x = 0.3 + 0.1 * v as f64;
            }
        }

        update_macroscopic(&mut field, &p, 0, 0);

        assert_eq!(field.rho[0], 1.0);
        assert_eq!(field.rho[1], 1.0);
        assert_eq!(field.rho[2], 0.0);
        assert!(field.u.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn half_step_force_scales_with_level() {
        let p = params();
        let mut field = LevelField::new(Grid3D::new(1, 1, 1), &p.velocities);
        field.initialise_equilibrium(&p.velocities, 2.0, &[0.0, 0.0]);
        field.force_xyz[0] = 1e-3;

        update_macroscopic(&mut field, &p, 0, 0);
        assert_relative_eq!(field.u[0], 0.5e-3, epsilon = 1e-15);

        update_site(&mut field, &p, 1, 0);
        assert_relative_eq!(field.u[0], 0.25e-3, epsilon = 1e-15);
        assert_relative_eq!(field.rho[0], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn site_update_leaves_averages_alone() {
        let p = params();
        let mut field = LevelField::new(Grid3D::new(2, 1, 1), &p.velocities);
        field.initialise_equilibrium(&p.velocities, 1.0, &[0.0, 0.0]);
        field.cell_f_mut(1)[1] += 0.1;

        update_site(&mut field, &p, 0, 1);

        assert_relative_eq!(field.rho[1], 1.1, epsilon = 1e-14);
        assert_relative_eq!(field.u[2], 0.1 / 1.1, epsilon = 1e-14);
        assert_eq!(field.rho_avg[1], 1.0);
        assert!(field.u_avg.iter().all(|&x| x == 0.0));
        assert!(field.uu_avg.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn averages_accumulate_products() {
        let p = params();
        let mut field = LevelField::new(Grid3D::new(1, 1, 1), &p.velocities);
        field.initialise_equilibrium(&p.velocities, 1.0, &[0.02, -0.01]);

        // Two samples of the same state keep every average at that state.
        update_macroscopic(&mut field, &p, 0, 1);
        update_macroscopic(&mut field, &p, 0, 2);

        assert_relative_eq!(field.rho_avg[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(field.u_avg[0], 0.02, epsilon = 1e-14);
        assert_relative_eq!(field.uu_avg[0], 0.02 * 0.02, epsilon = 1e-14);
        assert_relative_eq!(field.uu_avg[1], -0.02 * 0.01, epsilon = 1e-14);
        assert_relative_eq!(field.uu_avg[2], 0.01 * 0.01, epsilon = 1e-14);
    }
}
