// tests/validation.rs
//
// Integration-style validation tests (physics sanity checks).
// Run with: cargo test
// Or only these tests: cargo test --test validation

use std::cell::Cell;
use std::rc::Rc;

use lbm_refine::collision::equilibrium;
use lbm_refine::config::{
    CollisionModel, GravityConfig, RegionConfig, SolverConfig, mrt_rates_from_omega,
};
use lbm_refine::field::LevelField;
use lbm_refine::hooks::{HaloExchange, ImmersedBoundary};
use lbm_refine::lattice::{LatticeKind, VelocitySet};
use lbm_refine::params::LbmParams;
use lbm_refine::Solver;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn assert_rest(solver: &Solver, rho0: f64, u0: [f64; 3], tol: f64) {
    for lvl in solver.levels() {
        let f = &lvl.field;
        for idx in 0..f.n_cells() {
            if !f.site[idx].is_physical_fluid() {
                continue;
            }
            assert!(
                approx_eq(f.rho[idx], rho0, tol),
                "level {} cell {idx}: rho = {}",
                lvl.level,
                f.rho[idx]
            );
            for (d, &u) in f.cell_u(idx).iter().enumerate() {
                assert!(
                    approx_eq(u, u0[d], tol),
                    "level {} cell {idx}: u[{d}] = {u}",
                    lvl.level
                );
            }
        }
    }
}

#[test]
fn periodic_rest_state_is_a_fixed_point_2d() {
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 10, 10, 1, 1.0);
    cfg.periodic = true;
    let mut solver = Solver::new(&cfg).unwrap();

    solver.run(5);

    assert_eq!(solver.tick(), 5);
    assert_rest(&solver, 1.0, [0.0; 3], 1e-12);
}

#[test]
fn periodic_rest_state_is_a_fixed_point_3d_mrt() {
    let omega = 1.3;
    let mut cfg = SolverConfig::uniform(LatticeKind::D3Q19, 6, 5, 4, omega);
    cfg.periodic = true;
    cfg.collision.model = CollisionModel::Mrt;
    cfg.collision.mrt_rates = Some(mrt_rates_from_omega(LatticeKind::D3Q19, omega));
    let mut solver = Solver::new(&cfg).unwrap();

    solver.run(5);

    assert_rest(&solver, 1.0, [0.0; 3], 1e-12);
}

fn refined_cfg() -> SolverConfig {
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 16, 12, 1, 1.1);
    cfg.periodic = true;
    cfg.regions = vec![RegionConfig {
        lo: [4, 3, 0],
        hi: [12, 9, 1],
        regions: vec![RegionConfig {
            lo: [4, 3, 0],
            hi: [12, 9, 1],
            regions: Vec::new(),
        }],
    }];
    cfg
}

#[test]
fn refined_hierarchy_keeps_rest_state() {
    let mut solver = Solver::new(&refined_cfg()).unwrap();
    assert_eq!(solver.root().depth(), 3);

    solver.run(4);

    assert_rest(&solver, 1.0, [0.0; 3], 1e-12);
}

#[test]
fn uniform_drift_crosses_refinement_interfaces_unchanged() {
    let mut cfg = refined_cfg();
    cfg.initial.u = [0.04, -0.02, 0.0];
    let mut solver = Solver::new(&cfg).unwrap();

    solver.run(3);

    assert_rest(&solver, 1.0, [0.04, -0.02, 0.0], 1e-12);
}

#[test]
fn finer_levels_tick_twice_per_parent_tick() {
    let mut solver = Solver::new(&refined_cfg()).unwrap();
    solver.run(3);

    let ticks: Vec<u64> = solver.levels().iter().map(|l| l.t).collect();
    assert_eq!(ticks, vec![3, 6, 12]);
}

/// Amplitude of the sin(2πy/L) component of u_x.
fn shear_amplitude(field: &LevelField) -> f64 {
    let ny = field.grid.ny;
    let k = 2.0 * std::f64::consts::PI / ny as f64;
    let mut s = 0.0;
    for idx in 0..field.n_cells() {
        let y = field.grid.coords(idx)[1] as f64;
        s += field.u[idx * field.dims] * (k * y).sin();
    }
    2.0 * s / field.n_cells() as f64
}

fn decay_of_shear_wave(cfg: &SolverConfig, ticks: usize) -> (f64, f64) {
    let mut solver = Solver::new(cfg).unwrap();
    let vs = solver.params().velocities.clone();
    let ny = cfg.ny;
    let k = 2.0 * std::f64::consts::PI / ny as f64;
    let amp = 1e-3;

    let field = &mut solver.root_mut().field;
    for idx in 0..field.n_cells() {
        let y = field.grid.coords(idx)[1] as f64;
        let u = [amp * (k * y).sin(), 0.0];
        field.rho[idx] = 1.0;
        field.u[idx * 2] = u[0];
        field.u[idx * 2 + 1] = u[1];
        for v in 0..vs.nvel() {
            field.f[idx * vs.nvel() + v] = equilibrium(&vs, 1.0, &u, v);
        }
    }
    let a0 = shear_amplitude(field);

    solver.run(ticks);

    let a1 = shear_amplitude(&solver.root().field);
    let nu = (1.0 / cfg.collision.omega - 0.5) / 3.0;
    let expected = (-nu * k * k * ticks as f64).exp();
    (a1 / a0, expected)
}

#[test]
fn shear_wave_decays_at_the_bgk_viscosity() {
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 4, 32, 1, 1.0);
    cfg.periodic = true;

    let (ratio, expected) = decay_of_shear_wave(&cfg, 200);

    assert!(
        approx_eq(ratio, expected, 0.02 * expected),
        "decay {ratio} vs analytic {expected}"
    );
}

#[test]
fn shear_wave_decays_at_the_mrt_shear_rate() {
    let omega = 1.2;
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 4, 32, 1, omega);
    cfg.periodic = true;
    cfg.collision.model = CollisionModel::Mrt;
    // Ghost and energy moments relax at their own rates; only the stress rate sets ν.
    cfg.collision.mrt_rates = Some(vec![0.0, 1.4, 1.4, 0.0, 1.2, 0.0, 1.2, omega, omega]);

    let (ratio, expected) = decay_of_shear_wave(&cfg, 200);

    assert!(
        approx_eq(ratio, expected, 0.02 * expected),
        "decay {ratio} vs analytic {expected}"
    );
}

#[test]
fn gravity_accelerates_a_periodic_box_uniformly() {
    let g = 1e-5;
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 8, 8, 1, 1.0);
    cfg.periodic = true;
    cfg.gravity = Some(GravityConfig { axis: 0, g });
    let mut solver = Solver::new(&cfg).unwrap();

    let n = 10;
    solver.run(n);

    // With ω = 1 the recovered velocity after n ticks is exactly n·g.
    assert_rest(&solver, 1.0, [n as f64 * g, 0.0, 0.0], 1e-14);
    let p = solver.root().field.total_momentum();
    assert!(approx_eq(p[0], 64.0 * n as f64 * g, 1e-12));
}

// ------------------------------------------------------------
// Predictor-corrector ticks.
// ------------------------------------------------------------

struct ConstantForce {
    fx: f64,
    computed: Rc<Cell<usize>>,
    moved: Rc<Cell<usize>>,
}

impl ImmersedBoundary for ConstantForce {
    fn compute_forces(&mut self, field: &LevelField, _params: &LbmParams) -> Vec<f64> {
        self.computed.set(self.computed.get() + 1);
        let mut f = vec![0.0; field.n_cells() * field.dims];
        for idx in 0..field.n_cells() {
            f[idx * field.dims] = self.fx;
        }
        f
    }

    fn move_bodies(&mut self, _field: &LevelField) {
        self.moved.set(self.moved.get() + 1);
    }
}

#[test]
fn predictor_corrector_counts_as_one_tick() {
    let computed = Rc::new(Cell::new(0));
    let moved = Rc::new(Cell::new(0));
    let ib = ConstantForce {
        fx: 0.0,
        computed: computed.clone(),
        moved: moved.clone(),
    };
    let mut solver = Solver::new(&refined_cfg())
        .unwrap()
        .with_immersed_boundary(Box::new(ib));

    solver.run(4);

    assert_eq!(solver.tick(), 4);
    assert_eq!(computed.get(), 4);
    assert_eq!(moved.get(), 4);
    let ticks: Vec<u64> = solver.levels().iter().map(|l| l.t).collect();
    assert_eq!(ticks, vec![4, 8, 16]);
}

#[test]
fn corrector_with_zero_forcing_matches_a_plain_tick() {
    let mut cfg = refined_cfg();
    cfg.initial.u = [0.03, 0.01, 0.0];
    cfg.gravity = Some(GravityConfig { axis: 1, g: -2e-5 });

    let mut plain = Solver::new(&cfg).unwrap();
    let ib = ConstantForce {
        fx: 0.0,
        computed: Rc::new(Cell::new(0)),
        moved: Rc::new(Cell::new(0)),
    };
    let mut pc = Solver::new(&cfg).unwrap().with_immersed_boundary(Box::new(ib));

    plain.run(3);
    pc.run(3);

    for (a, b) in plain.levels().iter().zip(pc.levels().iter()) {
        assert_eq!(a.field.f, b.field.f, "level {}", a.level);
        assert_eq!(a.field.rho_avg, b.field.rho_avg, "level {}", a.level);
    }
}

#[test]
fn corrector_applies_the_computed_force() {
    let fx = 2e-5;
    let mut cfg = SolverConfig::uniform(LatticeKind::D2Q9, 6, 6, 1, 1.0);
    cfg.periodic = true;
    let ib = ConstantForce {
        fx,
        computed: Rc::new(Cell::new(0)),
        moved: Rc::new(Cell::new(0)),
    };
    let mut solver = Solver::new(&cfg).unwrap().with_immersed_boundary(Box::new(ib));

    solver.run(5);

    assert_rest(&solver, 1.0, [5.0 * fx, 0.0, 0.0], 1e-14);
}

// ------------------------------------------------------------
// Halo exchange hook.
// ------------------------------------------------------------

/// Single-direction exchange that overwrites cell 0 with a denser equilibrium.
struct OneCellHalo {
    rho: f64,
}

impl HaloExchange for OneCellHalo {
    fn directions(&self) -> usize {
        1
    }

    fn refresh(&mut self, _dir: usize, field: &mut LevelField) -> Vec<usize> {
        let vs = VelocitySet::new(LatticeKind::D2Q9);
        for (v, x) in field.cell_f_mut(0).iter_mut().enumerate() {
            *x = self.rho * vs.w[v];
        }
        vec![0]
    }

    fn is_recv_layer(&self, _idx: usize) -> bool {
        false
    }

    fn is_sender_layer(&self, _idx: usize) -> bool {
        false
    }

    fn is_periodic_overlap(&self, _idx: usize) -> bool {
        false
    }
}

#[test]
fn halo_cells_get_site_local_recovery_after_exchange() {
    let cfg = SolverConfig::uniform(LatticeKind::D2Q9, 5, 5, 1, 1.0);
    let mut solver = Solver::new(&cfg)
        .unwrap()
        .with_halo(Box::new(OneCellHalo { rho: 1.2 }));

    solver.step();

    let f = &solver.root().field;
    assert!(approx_eq(f.rho[0], 1.2, 1e-14));
    // Averages only see the bulk sweep, which ran before the exchange.
    assert!(approx_eq(f.rho_avg[0], 1.0, 1e-14));
}
