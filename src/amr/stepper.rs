// src/amr/stepper.rs

use crate::amr::coupling::{coalesce, explode};
use crate::amr::hierarchy::{build_hierarchy, GridLevel};
use crate::collision::collide;
use crate::config::SolverConfig;
use crate::error::ConfigError;
use crate::forcing::prepare_forces;
use crate::hooks::{BoundaryConditions, BoundaryPass, HaloExchange, ImmersedBoundary, NoBoundaries};
use crate::macroscopic::{update_macroscopic, update_site};
use crate::params::LbmParams;
use crate::stream::{stream, StreamContext};

/// How a level tick treats the Cartesian forces left in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Start from zero (ordinary ticks, predictor pass, every refined level).
    Reset,
    /// Build on the externally supplied forces (corrector pass, root only).
    Keep,
}

// ------------------------------------------------------------
// Recursive level kernel.
// ------------------------------------------------------------

/// One tick of `node` and, twice each, of every level nested inside it.
///
/// Order: PreCollision BCs, forcing, collision, {explode, child, child} per
/// region, Inlet and Wall BCs, stream, PostStream BCs, coalesce per region,
/// Outlet BCs, macroscopic recovery, tick counter.
pub fn run_level(
    node: &mut GridLevel,
    params: &LbmParams,
    bc: &mut dyn BoundaryConditions,
    halo: Option<&dyn HaloExchange>,
    mode: ForceMode,
) {
    let level = node.level;
    let t = node.t;
    log::trace!("level {level} tick {t}: enter");

    bc.apply(BoundaryPass::PreCollision, level, &mut node.field, params);
    prepare_forces(&mut node.field, params, node.relax.omega, mode == ForceMode::Reset);
    collide(&mut node.field, params, &node.relax);

    for child in node.children.iter_mut() {
        explode(&node.field, &mut child.grid.field, child.region);
        for _ in 0..2 {
            run_level(&mut child.grid, params, bc, None, ForceMode::Reset);
        }
    }

    bc.apply(BoundaryPass::Inlet, level, &mut node.field, params);
    bc.apply(BoundaryPass::Wall, level, &mut node.field, params);

    let ctx = if level == 0 {
        StreamContext::coarsest(halo)
    } else {
        StreamContext::refined()
    };
    stream(&mut node.field, params, ctx);
    bc.apply(BoundaryPass::PostStream, level, &mut node.field, params);

    for child in node.children.iter() {
        coalesce(&mut node.field, &child.grid.field, child.region);
    }

    bc.apply(BoundaryPass::Outlet, level, &mut node.field, params);
    update_macroscopic(&mut node.field, params, level, t);
    node.t += 1;

    log::trace!("level {level} tick {t}: exit");
}

// ------------------------------------------------------------
// Driver.
// ------------------------------------------------------------

/// Owns the level tree and the collaborators and advances them tick by tick.
pub struct Solver {
    params: LbmParams,
    root: GridLevel,
    boundaries: Box<dyn BoundaryConditions>,
    halo: Option<Box<dyn HaloExchange>>,
    immersed: Option<Box<dyn ImmersedBoundary>>,
}

impl Solver {
    /// Validate `cfg` and build the initialised hierarchy.
    pub fn new(cfg: &SolverConfig) -> Result<Self, ConfigError> {
        let (params, relax) = cfg.build_params()?;
        let root = build_hierarchy(cfg, &params, relax)?;
        Ok(Self::from_parts(params, root))
    }

    pub fn from_parts(params: LbmParams, root: GridLevel) -> Self {
        Self {
            params,
            root,
            boundaries: Box::new(NoBoundaries),
            halo: None,
            immersed: None,
        }
    }

    pub fn with_boundaries(mut self, bc: Box<dyn BoundaryConditions>) -> Self {
        self.boundaries = bc;
        self
    }

    pub fn with_halo(mut self, halo: Box<dyn HaloExchange>) -> Self {
        self.halo = Some(halo);
        self
    }

    /// Attaching an immersed boundary switches the root to predictor-corrector ticks.
    pub fn with_immersed_boundary(mut self, ib: Box<dyn ImmersedBoundary>) -> Self {
        self.immersed = Some(ib);
        self
    }

    pub fn params(&self) -> &LbmParams {
        &self.params
    }

    pub fn root(&self) -> &GridLevel {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut GridLevel {
        &mut self.root
    }

    /// Completed external ticks (the root level's counter).
    pub fn tick(&self) -> u64 {
        self.root.t
    }

    /// Every level, depth-first, for diagnostics and output.
    pub fn levels(&self) -> Vec<&GridLevel> {
        self.root.levels()
    }

    /// Advance the whole hierarchy by one coarsest-level tick.
    pub fn step(&mut self) {
        let Self {
            params,
            root,
            boundaries,
            halo,
            immersed,
        } = self;
        let bc = boundaries.as_mut();

        match immersed.as_deref_mut() {
            None => run_level(root, params, bc, halo.as_deref(), ForceMode::Reset),
            Some(ib) => {
                let snap = root.snapshot();

                log::debug!("tick {}: predictor", root.t);
                run_level(root, params, bc, halo.as_deref(), ForceMode::Reset);

                root.field.reset_forces();
                let forces = ib.compute_forces(&root.field, params);
                assert_eq!(
                    forces.len(),
                    root.field.force_xyz.len(),
                    "immersed boundary returned forces of the wrong length"
                );
                root.field.force_xyz.copy_from_slice(&forces);

                root.restore(&snap);

                log::debug!("tick {}: corrector", root.t);
                run_level(root, params, bc, halo.as_deref(), ForceMode::Keep);

                ib.move_bodies(&root.field);
            }
        }

        if let Some(h) = halo.as_deref_mut() {
            for dir in 0..h.directions() {
                for idx in h.refresh(dir, &mut root.field) {
                    update_site(&mut root.field, params, 0, idx);
                }
            }
        }
    }

    /// Run `n` ticks.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }
}
