// src/forcing.rs
//
// Guo et al. (2002) forcing. Two modifications of the plain scheme:
//  1) the lattice force F_v is added to the post-collision populations;
//  2) Δt/2 · F is added to the momentum in the macroscopic recovery.
//
//   F_v = (1 − ω/2) (w_v / cs²) Σ_d F_d ( c_vd (1 + c_v·u / cs²) − u_d )

use rayon::prelude::*;

use crate::field::LevelField;
use crate::params::LbmParams;
use crate::site::SiteType;

/// Add ρ·g along the gravity axis to the Cartesian force of every non-solid cell.
pub fn add_gravity(field: &mut LevelField, params: &LbmParams) {
    let Some(g) = params.gravity else {
        return;
    };
    let dims = field.dims;
    for idx in 0..field.n_cells() {
        if field.site[idx].is_solid() {
            continue;
        }
        field.force_xyz[idx * dims + g.axis] += field.rho[idx] * g.g;
    }
}

/// Project the Cartesian force onto the lattice directions, overwriting `force_lattice`.
pub fn project_lattice_forces(field: &mut LevelField, params: &LbmParams, omega: f64) {
    let vs = &params.velocities;
    let nvel = field.nvel;
    let dims = field.dims;
    let cs2 = vs.cs2;
    let prefactor = 1.0 - 0.5 * omega;

    let LevelField {
        force_lattice,
        force_xyz,
        u,
        site,
        ..
    } = field;
    let force_xyz: &[f64] = force_xyz;
    let u: &[f64] = u;
    let site: &[SiteType] = site;

    force_lattice
        .par_chunks_mut(nvel)
        .enumerate()
        .for_each(|(idx, out)| {
            if site[idx] == SiteType::Solid {
                out.fill(0.0);
                return;
            }
            let fx = &force_xyz[idx * dims..(idx + 1) * dims];
            let ux = &u[idx * dims..(idx + 1) * dims];
            for (v, o) in out.iter_mut().enumerate() {
                let beta = vs.c_dot(v, ux) / cs2;
                let mut s = 0.0;
                for d in 0..dims {
                    s += fx[d] * (vs.c[v][d] as f64 * (1.0 + beta) - ux[d]);
                }
                *o = prefactor * vs.w[v] / cs2 * s;
            }
        });
}

/// Forcing for one level tick.
///
/// With `reset` the Cartesian forces start from zero; otherwise whatever an
/// external collaborator stored in `force_xyz` is kept and built upon.
pub fn prepare_forces(field: &mut LevelField, params: &LbmParams, omega: f64, reset: bool) {
    if reset {
        field.reset_forces();
    }
    add_gravity(field, params);
    project_lattice_forces(field, params, omega);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3D;
    use crate::lattice::{LatticeKind, VelocitySet};
    use crate::params::{CollisionOperator, Gravity};
    use approx::assert_relative_eq;

    fn params(gravity: Option<Gravity>) -> LbmParams {
        LbmParams {
            velocities: VelocitySet::new(LatticeKind::D2Q9),
            collision: CollisionOperator::Bgk,
            periodic: true,
            gravity,
        }
    }

    #[test]
    fn lattice_force_moments_match_cartesian_force() {
        // At rest, Σ F_v = 0 and Σ c_v F_v = (1 − ω/2) F.
        let p = params(None);
        let mut field = LevelField::new(Grid3D::new(1, 1, 1), &p.velocities);
        field.initialise_equilibrium(&p.velocities, 1.0, &[0.0, 0.0]);
        field.force_xyz[0] = 1e-4;
        field.force_xyz[1] = -2e-4;
        let omega = 1.2;
        project_lattice_forces(&mut field, &p, omega);

        let vs = &p.velocities;
        let s0: f64 = field.force_lattice.iter().sum();
        assert_relative_eq!(s0, 0.0, epsilon = 1e-18);
        for d in 0..2 {
            let s1: f64 = (0..9).map(|v| vs.c[v][d] as f64 * field.force_lattice[v]).sum();
            assert_relative_eq!(s1, (1.0 - 0.5 * omega) * field.force_xyz[d], epsilon = 1e-16);
        }
    }

    #[test]
    fn gravity_accumulates_on_fluid_only() {
        let p = params(Some(Gravity { axis: 1, g: -1e-5 }));
        let mut field = LevelField::new(Grid3D::new(2, 1, 1), &p.velocities);
        field.set_site(1, 0, 0, SiteType::Solid);
        field.initialise_equilibrium(&p.velocities, 2.0, &[0.0, 0.0]);

        prepare_forces(&mut field, &p, 1.0, true);

        assert_relative_eq!(field.force_xyz[1], -2e-5);
        assert_eq!(field.force_xyz[3], 0.0);
        assert!(field.force_lattice[9..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn keep_mode_preserves_external_forces() {
        let p = params(None);
        let mut field = LevelField::new(Grid3D::new(1, 1, 1), &p.velocities);
        field.initialise_equilibrium(&p.velocities, 1.0, &[0.0, 0.0]);
        field.force_xyz[0] = 3e-4;

        prepare_forces(&mut field, &p, 1.0, false);
        assert_eq!(field.force_xyz[0], 3e-4);
        assert!(field.force_lattice.iter().any(|&x| x != 0.0));

        prepare_forces(&mut field, &p, 1.0, true);
        assert!(field.force_lattice.iter().all(|&x| x == 0.0));
    }
}
